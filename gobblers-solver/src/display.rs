//! Fixed-width text rendering of a position, hiding covered pieces.

use gobblers_core::{Board, Owner, Pos};

/// Render the board as a 3×3 grid. The visible piece on each square shows
/// as `X` (side to move) or `O` (opponent) plus its 1-based size digit;
/// every square is labeled with its index. Callers wanting a fixed player
/// on `X` swap sides before rendering.
pub fn render(board: Board) -> String {
    let mut out = String::new();
    for row in 0..3u8 {
        out.push_str("      |      |\n");
        for col in 0..3u8 {
            let (owner_ch, size_ch) = match board.top_piece(Pos::from_row_col(row, col)) {
                Some((Owner::Mover, size)) => ('X', char::from(b'1' + size as u8)),
                Some((Owner::Opponent, size)) => ('O', char::from(b'1' + size as u8)),
                None => (' ', ' '),
            };
            out.push_str("  ");
            out.push(owner_ch);
            out.push(size_ch);
            if col < 2 {
                out.push_str("  |");
            }
        }
        out.push('\n');
        for col in 0..3u8 {
            out.push_str("     ");
            out.push(char::from(b'0' + row * 3 + col));
            if col < 2 {
                out.push('|');
            }
        }
        out.push('\n');
        if row < 2 {
            out.push_str("------|------|------\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gobblers_core::{Move, Size};

    #[test]
    fn empty_board_shows_square_indices() {
        let text = render(Board::new());
        // Empty squares render as blanks, so compare with trailing
        // whitespace trimmed.
        let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
        let expected = [
            "      |      |",
            "      |      |",
            "     0|     1|     2",
            "------|------|------",
            "      |      |",
            "      |      |",
            "     3|     4|     5",
            "------|------|------",
            "      |      |",
            "      |      |",
            "     6|     7|     8",
        ];
        assert_eq!(lines, expected);
    }

    #[test]
    fn pieces_show_owner_and_size() {
        let board = Board::new()
            .apply(Move::Place {
                size: Size::Large,
                to: Pos(4),
            })
            .swap_sides()
            .apply(Move::Place {
                size: Size::Small,
                to: Pos(0),
            });
        // From the second player's seat: their small is X, the first
        // player's large is O.
        let text = render(board);
        assert!(text.contains("  X1"));
        assert!(text.contains("  O3"));
    }

    #[test]
    fn covered_pieces_stay_hidden() {
        let board = Board::new()
            .apply(Move::Place {
                size: Size::Small,
                to: Pos(4),
            })
            .swap_sides()
            .apply(Move::Place {
                size: Size::Large,
                to: Pos(4),
            });
        let text = render(board);
        assert!(text.contains("  X3"));
        assert!(!text.contains("O1"));
    }
}
