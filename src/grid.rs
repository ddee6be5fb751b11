use std::io::BufRead;

use crate::direction::Direction;
use crate::error::SolveError;
use crate::point::Point;

/// An immutable rectangle of per-cell entry costs, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    costs: Vec<u32>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<u32>>) -> Result<Grid, SolveError> {
        let height = rows.len();
        let width = rows.first().ok_or(SolveError::EmptyGrid)?.len();

        for (row, cells) in rows.iter().enumerate() {
            if cells.is_empty() || cells.len() != width {
                return Err(SolveError::RaggedRow {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        if width * height == 1 {
            return Err(SolveError::SingleCell);
        }

        Ok(Grid {
            width,
            height,
            costs: rows.into_iter().flatten().collect(),
        })
    }

    // Read digit rows up to the first blank line (or EOF)
    // Anything after that blank line is left in the reader
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Grid, SolveError> {
        let mut rows = Vec::new();

        for (y, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                break;
            }

            let row = line
                .chars()
                .enumerate()
                .map(|(x, c)| {
                    c.to_digit(10).ok_or(SolveError::InvalidCost {
                        row: y,
                        col: x,
                        found: c,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rows.push(row);
        }

        Grid::new(rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn origin(&self) -> Point {
        Point::ORIGIN
    }

    /// The bottom-right cell.
    pub fn corner(&self) -> Point {
        Point {
            x: self.width as isize - 1,
            y: self.height as isize - 1,
        }
    }

    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= 0 && pt.y >= 0 && (pt.x as usize) < self.width && (pt.y as usize) < self.height
    }

    /// Cost of entering `pt`, or `None` off the grid.
    pub fn get(&self, pt: Point) -> Option<u32> {
        if !self.contains(pt) {
            return None;
        }

        let index = pt.y as usize * self.width + pt.x as usize;
        Some(self.costs[index])
    }

    // Draw the grid with each step of a route replaced by the heading it entered with
    pub fn stringify(&self, route: &[(Point, Direction)]) -> String {
        let mut output = String::new();

        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                let pt = Point { x, y };

                match route.iter().rev().find(|(p, _)| *p == pt) {
                    Some((_, direction)) => output.push(char::from(*direction)),
                    None => {
                        let cost = self.get(pt).unwrap_or_default();
                        output.push_str(&cost.to_string());
                    }
                }
            }
            output.push('\n');
        }

        output
    }
}
