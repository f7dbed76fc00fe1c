use ratatui::layout::Rect;

/// Whether (x, y) falls inside `rect`. Computed in u32 so rects touching the
/// u16 edge don't overflow.
#[inline]
pub fn is_inside(x: u16, y: u16, rect: Rect) -> bool {
    let (x, y) = (x as u32, y as u32);
    let (rx, ry) = (rect.x as u32, rect.y as u32);

    x >= rx && x < rx + rect.width as u32 && y >= ry && y < ry + rect.height as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(2, 3, 4, 2);
        assert!(is_inside(2, 3, r));
        assert!(is_inside(5, 4, r));
        assert!(!is_inside(6, 4, r));
        assert!(!is_inside(2, 5, r));
        assert!(!is_inside(1, 3, r));
    }

    #[test]
    fn test_no_overflow_at_u16_max() {
        let r = Rect {
            x: u16::MAX - 1,
            y: u16::MAX - 1,
            width: 10,
            height: 10,
        };
        assert!(is_inside(u16::MAX, u16::MAX, r));
    }
}
