use crate::match3::{Board, Cell};

/// Parses an array of string slices into a `Board<char>`.
///
/// Each string slice represents a row, starting from the top (row 0). Every
/// character becomes one cell: `.` is an empty cell and any other character is
/// a tile holding that character. Multi-byte characters such as emoji count as
/// one cell each.
///
/// # Arguments
/// * `s`: The rows of the board. All rows must have the same character count.
///
/// # Returns
/// * `Ok(Board<char>)` if parsing is successful.
/// * `Err(String)` if a row's length differs from the first row's, or if a row
///   contains whitespace.
///
/// # Examples
/// ```
/// use tile_puzzles::utils::grid_from_str_rows;
///
/// let board = grid_from_str_rows(&["AB.", "C.D"]).unwrap();
/// assert_eq!(board.rows(), 2);
/// assert_eq!(board.cols(), 3);
/// assert_eq!(board.get_tile(0, 1), Some(&'B'));
/// assert_eq!(board.get_tile(0, 2), None);
///
/// assert!(grid_from_str_rows(&["AB", "C"]).is_err());
/// ```
pub fn grid_from_str_rows(s: &[&str]) -> Result<Board<char>, String> {
    let mut rows = Vec::with_capacity(s.len());
    for (r, row_str) in s.iter().enumerate() {
        let mut row = Vec::new();
        for (c, ch) in row_str.chars().enumerate() {
            if ch.is_whitespace() {
                return Err(format!(
                    "Unrecognized character {:?} in row {} col {}",
                    ch, r, c
                ));
            }
            row.push(if ch == '.' {
                Cell::Empty
            } else {
                Cell::Occupied(ch)
            });
        }
        rows.push(row);
    }
    Board::from_rows(rows)
}
