/// Indentation unit, fixed by the first indented line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentUnit {
    /// One tab per level
    Tabs,
    /// A fixed number of spaces per level
    Spaces(usize),
}

impl IndentUnit {
    fn describe(self) -> String {
        match self {
            IndentUnit::Tabs => "tabs".to_string(),
            IndentUnit::Spaces(1) => "1 space".to_string(),
            IndentUnit::Spaces(n) => format!("{} spaces", n),
        }
    }
}

/// Indentation that does not fit the inferred unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mixed {
    /// Byte offset within the whitespace run
    pub at: usize,
    pub help: String,
}

/// Classifies leading whitespace into indentation levels
#[derive(Debug, Default)]
pub(crate) struct IndentTracker {
    unit: Option<IndentUnit>,
}

impl IndentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> Option<IndentUnit> {
        self.unit
    }

    /// Level of a run of leading spaces and tabs
    pub fn level(&mut self, ws: &str) -> Result<usize, Mixed> {
        if ws.is_empty() {
            return Ok(0);
        }
        let unit = self.resolve(ws);
        let (expected, width) = match unit {
            IndentUnit::Tabs => (b'\t', 1),
            IndentUnit::Spaces(width) => (b' ', width),
        };

        if let Some(at) = ws.bytes().position(|b| b != expected) {
            return Err(Mixed {
                at,
                help: format!("indentation uses {}", unit.describe()),
            });
        }
        if ws.len() % width != 0 {
            return Err(Mixed {
                at: ws.len(),
                help: format!(
                    "indentation uses {}; this line has {}",
                    unit.describe(),
                    IndentUnit::Spaces(ws.len()).describe()
                ),
            });
        }
        Ok(ws.len() / width)
    }

    /// Byte length of `levels` indentation units at the start of `ws`, or
    /// `None` if `ws` is shallower than that
    pub fn prefix_len(&mut self, ws: &str, levels: usize) -> Option<usize> {
        if ws.is_empty() {
            return None;
        }
        let (expected, width) = match self.resolve(ws) {
            IndentUnit::Tabs => (b'\t', levels),
            IndentUnit::Spaces(width) => (b' ', levels * width),
        };
        let fits = ws.len() >= width && ws.bytes().take(width).all(|b| b == expected);
        fits.then_some(width)
    }

    fn resolve(&mut self, ws: &str) -> IndentUnit {
        *self.unit.get_or_insert_with(|| {
            let unit = if ws.starts_with('\t') {
                IndentUnit::Tabs
            } else {
                IndentUnit::Spaces(ws.bytes().take_while(|&b| b == b' ').count())
            };
            tracing::trace!(?unit, "indentation unit inferred");
            unit
        })
    }
}
