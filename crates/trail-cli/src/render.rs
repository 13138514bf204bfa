//! Terminal frame renderer

use std::io::{self, Stdout, Write};
use std::time::Duration;

use tracing::debug;

use trail_rl::{Frame, FrameRenderer};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Draws each frame as ASCII art with a one-line header, pausing between frames
pub struct TerminalRenderer<W: Write + Send = Stdout> {
    out: W,
    delay: Duration,
    clear: bool,
}

impl TerminalRenderer {
    pub fn stdout(delay: Duration) -> Self {
        Self::new(io::stdout(), delay)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, delay: Duration) -> Self {
        Self {
            out,
            delay,
            clear: true,
        }
    }

    /// Append frames instead of redrawing in place
    pub fn without_clear(mut self) -> Self {
        self.clear = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &Frame<'_>) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        writeln!(
            self.out,
            "Episode {} | step {} | checkpoint {}/{} | reward {:.1} | epsilon {:.3}",
            frame.episode,
            frame.step,
            frame.progress.min(frame.checkpoints().len()),
            frame.checkpoints().len(),
            frame.episode_reward,
            frame.epsilon
        )?;
        self.out.write_all(frame.to_ascii().as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write + Send> FrameRenderer for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) {
        if let Err(e) = self.draw(frame) {
            debug!("Failed to draw frame: {}", e);
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trail_core::{Grid, Maze, Position};

    #[test]
    fn test_renders_header_and_grid() {
        let grid = Grid::from_ascii(&["..#", "..."]).unwrap();
        let maze = Maze::new(grid, vec![Position::new(1, 2)], Position::new(0, 0)).unwrap();
        let frame = Frame {
            maze: &maze,
            agent: Position::new(0, 1),
            progress: 0,
            episode: 4,
            step: 1,
            epsilon: 0.5,
            episode_reward: -0.1,
        };

        let mut renderer = TerminalRenderer::new(Vec::new(), Duration::ZERO).without_clear();
        renderer.render(&frame);
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Episode 4 | step 1 | checkpoint 0/1 | reward -0.1 | epsilon 0.500")
        );
        assert_eq!(lines.next(), Some(".A#"));
        assert_eq!(lines.next(), Some("..1"));
    }
}
