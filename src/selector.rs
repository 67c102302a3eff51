//! Mode selection carried in the page URL.
//!
//! A query string looks like `?LG_3_7`: a family tag followed by two indices.
//! Anything that does not parse cleanly falls back to `HG_0_0`; there is no
//! error channel back to the visitor.

use serde::Serialize;
use std::fmt;

/// Both indices run over `0..GRID_SIZE`.
pub const GRID_SIZE: u32 = 10;

/// Hue step between consecutive grid rows, in degrees.
const ROW_HUE_STEP: u32 = 50;

/// Beam family shown on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Mode {
    /// Hermite-Gaussian, indexed by (nx, ny).
    #[default]
    HG,
    /// Laguerre-Gaussian, indexed by (p, m).
    LG,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::HG, Mode::LG];

    /// Tags are case-sensitive: `hg` is not a mode.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "HG" => Some(Mode::HG),
            "LG" => Some(Mode::LG),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::HG => "HG",
            Mode::LG => "LG",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode family plus its two indices.
///
/// Fields are private so that both indices always lie in `0..GRID_SIZE`;
/// `new`, `parse` and `Default` are the only ways in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Selection {
    mode: Mode,
    i: u32,
    j: u32,
}

impl Selection {
    pub fn new(mode: Mode, i: u32, j: u32) -> Option<Self> {
        if i >= GRID_SIZE || j >= GRID_SIZE {
            return None;
        }
        Some(Selection { mode, i, j })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// First index: `nx` for HG, `p` for LG.
    pub fn i(&self) -> u32 {
        self.i
    }

    /// Second index: `ny` for HG, `m` for LG.
    pub fn j(&self) -> u32 {
        self.j
    }

    /// Same indices, other family.
    pub fn with_mode(self, mode: Mode) -> Self {
        Selection { mode, ..self }
    }

    /// Link target encoding this selection, e.g. `?HG_2_5`.
    pub fn query(&self) -> String {
        format!("?{}_{}_{}", self.mode, self.i, self.j)
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.png", self.i, self.j)
    }

    /// Relative image path, `img/<MODE>/<i>_<j>.png`.
    pub fn image_path(&self) -> String {
        format!("img/{}/{}", self.mode, self.file_name())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.mode, self.i, self.j)
    }
}

/// Parse a raw query string (leading `?` optional) into a selection.
///
/// Absent, empty or malformed input yields `Selection::default()`.
pub fn parse(query: Option<&str>) -> Selection {
    let Some(raw) = query else {
        return Selection::default();
    };
    match try_parse(raw) {
        Some(selection) => selection,
        None => {
            if !raw.trim_start_matches('?').is_empty() {
                tracing::debug!(query = raw, "unrecognized selection, using default");
            }
            Selection::default()
        }
    }
}

fn try_parse(raw: &str) -> Option<Selection> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut tokens = raw.split('_');
    let mode = Mode::from_tag(tokens.next()?)?;
    let i = parse_index(tokens.next()?)?;
    let j = parse_index(tokens.next()?)?;
    if tokens.next().is_some() {
        return None;
    }
    Selection::new(mode, i, j)
}

/// Plain decimal digits only, value below `GRID_SIZE`.
pub fn parse_index(token: &str) -> Option<u32> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u32>().ok().filter(|&v| v < GRID_SIZE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeLink {
    pub mode: Mode,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
    pub label: String,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    pub index: u32,
    pub background: String,
    pub cells: Vec<GridCell>,
}

/// Everything the page needs to show for one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub selection: Selection,
    pub image_src: String,
    pub mode_links: Vec<ModeLink>,
    pub grid: Vec<GridRow>,
}

pub fn row_hue(row: u32) -> u32 {
    (row * ROW_HUE_STEP) % 360
}

pub fn row_background(row: u32) -> String {
    format!("hsl({}, 100%, 80%)", row_hue(row))
}

/// Derive the page state for `selection`.
pub fn view(selection: Selection) -> PageView {
    let mode_links = Mode::ALL
        .iter()
        .map(|&mode| ModeLink {
            mode,
            href: selection.with_mode(mode).query(),
            active: mode == selection.mode,
        })
        .collect();

    let grid = (0..GRID_SIZE)
        .map(|row| GridRow {
            index: row,
            background: row_background(row),
            cells: (0..GRID_SIZE)
                .map(|col| {
                    let target = Selection {
                        mode: selection.mode,
                        i: row,
                        j: col,
                    };
                    GridCell {
                        row,
                        col,
                        label: format!("{row},{col}"),
                        href: target.query(),
                        active: row == selection.i && col == selection.j,
                    }
                })
                .collect(),
        })
        .collect();

    PageView {
        selection,
        image_src: selection.image_path(),
        mode_links,
        grid,
    }
}
