// Overlays drawn on top of the presented frame: a crosshair at the pointer and
// a tiny 5x7 bitmap font for the HUD ("ACTIVE | FPS: 59.9").

use crate::types::FrameBuffer;

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 || x as usize >= fb.width || y as usize >= fb.height {
        return;
    }
    fb.pixels[y as usize * fb.width + x as usize] = color;
}

fn hline(fb: &mut FrameBuffer, x0: i32, x1: i32, y: i32, color: u32) {
    for x in x0..=x1 {
        put_pixel(fb, x, y, color);
    }
}

fn vline(fb: &mut FrameBuffer, x: i32, y0: i32, y1: i32, color: u32) {
    for y in y0..=y1 {
        put_pixel(fb, x, y, color);
    }
}

/// "+" with a small gap in the middle, centred on (cx,cy).
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    hline(fb, cx - size, cx - 2, cy, color);
    hline(fb, cx + 2, cx + size, cy, color);
    vline(fb, cx, cy - size, cy - 2, color);
    vline(fb, cx, cy + 2, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/// Rows of a 5x7 glyph; bit 4 is the leftmost pixel. Only what the HUD prints.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        ' ' => [0; 7],
        '|' => [0b00100; 7],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00100, 0b00000],
        _ => return None,
    };
    Some(rows)
}

fn blit_glyph(fb: &mut FrameBuffer, x: i32, y: i32, rows: &[u8; 7], color: u32) {
    for (ry, bits) in rows.iter().enumerate() {
        for rx in 0..5 {
            if bits & (1 << (4 - rx)) != 0 {
                put_pixel(fb, x + rx, y + ry as i32, color);
            }
        }
    }
}

/// Text with a 1-pixel black drop shadow so it reads over the flame.
/// Unknown characters advance the cursor but draw nothing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        if let Some(rows) = glyph5x7(ch) {
            blit_glyph(fb, x + 1, y + 1, &rows, 0x00_00_00_00);
            blit_glyph(fb, x, y, &rows, color);
        }
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}
