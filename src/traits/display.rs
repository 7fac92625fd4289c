//! Two-line character display abstraction.
//!
//! This module defines the [`CharacterDisplay`] trait for 16x2 character
//! LCDs, the [`LcdLine`] fixed-width line type, and [`DisplayLease`], a scoped
//! owner that releases the display exactly once when it goes out of scope.

use core::fmt::Write;

use heapless::String as HString;

/// Columns on the character LCD.
pub const LCD_COLUMNS: usize = 16;

/// One display line, at most [`LCD_COLUMNS`] characters.
pub type LcdLine = HString<LCD_COLUMNS>;

/// Builds an [`LcdLine`] from `text`, truncating at the column limit.
///
/// ```
/// use rs_blinkz::traits::lcd_line;
///
/// assert_eq!(lcd_line("Sending:").as_str(), "Sending:");
/// assert_eq!(lcd_line("A MESSAGE THAT IS TOO LONG").as_str(), "A MESSAGE THAT I");
/// ```
pub fn lcd_line(text: &str) -> LcdLine {
    let mut line = LcdLine::new();
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
    line
}

/// Builds an [`LcdLine`] left-justified and space-padded to full width.
///
/// ```
/// use rs_blinkz::traits::lcd_line_padded;
///
/// let line = lcd_line_padded("Temp:71F");
/// assert_eq!(line.as_str(), "Temp:71F        ");
/// assert_eq!(line.len(), 16);
/// ```
pub fn lcd_line_padded(text: &str) -> LcdLine {
    let mut line = lcd_line(text);
    while line.push(' ').is_ok() {}
    line
}

/// Formats `args` into an [`LcdLine`], truncating on overflow.
pub fn lcd_format(args: core::fmt::Arguments<'_>) -> LcdLine {
    let mut full: HString<64> = HString::new();
    // Overflowing the scratch buffer only loses characters past the LCD width.
    let _ = full.write_fmt(args);
    lcd_line(&full)
}

/// Character display with two lines.
///
/// # Example
///
/// ```ignore
/// use rs_blinkz::traits::CharacterDisplay;
///
/// struct MyLcd { /* pins */ }
///
/// impl CharacterDisplay for MyLcd {
///     type Error = ();
///
///     fn update(&mut self, lines: [&str; 2]) -> Result<(), ()> {
///         // clear, then write lines[0] on row 0 and lines[1] on row 1
///         Ok(())
///     }
///     fn clear(&mut self) -> Result<(), ()> { Ok(()) }
///     fn release(&mut self) -> Result<(), ()> {
///         // clear and deinit the data/control pins
///         Ok(())
///     }
/// }
/// ```
pub trait CharacterDisplay {
    /// Error type for display operations.
    type Error: core::fmt::Debug;

    /// Replaces the screen contents with `lines`.
    fn update(&mut self, lines: [&str; 2]) -> Result<(), Self::Error>;

    /// Blanks the screen.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Clears the screen and releases the underlying pins.
    ///
    /// After release the display must not be used again.
    fn release(&mut self) -> Result<(), Self::Error>;
}

/// Scoped ownership of a [`CharacterDisplay`].
///
/// The display is released exactly once: either explicitly through
/// [`DisplayLease::release`] or when the lease is dropped, including during
/// unwinding. Release failures are logged and otherwise ignored.
pub struct DisplayLease<D: CharacterDisplay> {
    display: D,
    released: bool,
}

impl<D: CharacterDisplay> DisplayLease<D> {
    /// Takes ownership of `display`.
    pub fn new(display: D) -> Self {
        Self {
            display,
            released: false,
        }
    }

    /// Writes both lines.
    pub fn show(&mut self, line1: &str, line2: &str) -> Result<(), D::Error> {
        self.display.update([line1, line2])
    }

    /// Releases the display now.
    pub fn release(mut self) -> Result<(), D::Error> {
        self.release_once().unwrap_or(Ok(()))
    }

    fn release_once(&mut self) -> Option<Result<(), D::Error>> {
        if self.released {
            return None;
        }
        self.released = true;
        Some(self.display.release())
    }
}

impl<D: CharacterDisplay> Drop for DisplayLease<D> {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.release_once() {
            log::warn!("display release failed: {:?}", e);
        }
    }
}
