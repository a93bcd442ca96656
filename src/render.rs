use crate::input::Scene;
use crossterm::{
    cursor,
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use isogrove::dex::{self, DexEntry};
use isogrove::registry::Rarity;
use isogrove::stage::{format_remaining, Stage};
use isogrove::{Farm, PlantInfo, Tile};
use isogrove::storage::SaveStore;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

/* -----------------------------
   Grove grid
------------------------------ */

pub(crate) const TILE_W: u16 = 3;
pub(crate) const GRID_X: u16 = 2;

fn rarity_color(r: Rarity) -> Color {
    match r {
        Rarity::Common => Color::Green,
        Rarity::Rare => Color::Cyan,
        Rarity::Goated => Color::Magenta,
        Rarity::Hidden => Color::Yellow,
    }
}

fn stage_glyph(stage: Stage, multi: bool) -> char {
    match (stage, multi) {
        (Stage::Unknown, _) => '?',
        (Stage::Seedling, _) => '.',
        (Stage::Plant, false) => 't',
        (Stage::Plant, true) => 'y',
        (Stage::Mature, false) => 'T',
        (Stage::Mature, true) => 'Y',
    }
}

pub(crate) struct GroveView<'a> {
    pub(crate) cursor: Tile,
    pub(crate) removal_mode: bool,
    pub(crate) grid_y: u16,
    pub(crate) hover: Option<&'a PlantInfo>,
    pub(crate) selected: Option<&'a str>,
    pub(crate) difficulty: &'a str,
    pub(crate) status: &'a str,
    pub(crate) color: bool,
    pub(crate) now: i64,
}

pub(crate) fn draw_grove<S: SaveStore>(buf: &mut CellBuffer, farm: &Farm<S>, view: &GroveView) {
    let bg = Color::Black;
    let plain = |c: Color| if view.color { c } else { Color::White };
    let bounds = farm.bounds();
    let reg = farm.registry();

    for iy in 0..bounds.rows {
        for ix in 0..bounds.cols {
            let tile = Tile::new(ix, iy);
            let x = GRID_X.saturating_add((ix as u16).saturating_mul(TILE_W));
            let y = view.grid_y.saturating_add(iy as u16);

            let (glyph, fg) = match farm.plant_index_at(tile) {
                Some(i) => {
                    let p = &farm.plants()[i];
                    let stage = farm.stage_of(i, view.now);
                    let fg = match (stage, reg.get(&p.species)) {
                        (Stage::Mature, Some(sp)) => rarity_color(sp.rarity),
                        (Stage::Plant, _) => Color::DarkGreen,
                        (Stage::Seedling, _) => Color::DarkYellow,
                        _ => Color::Red,
                    };
                    (stage_glyph(stage, p.is_multi_tile.unwrap_or(false)), fg)
                }
                None => ('·', Color::DarkGrey),
            };

            let (l, r) = if tile == view.cursor {
                if view.removal_mode {
                    ('<', '>')
                } else {
                    ('[', ']')
                }
            } else {
                (' ', ' ')
            };
            let cursor_fg = if view.removal_mode { Color::Red } else { Color::White };
            buf.set(x, y, Cell { ch: l, fg: plain(cursor_fg), bg });
            buf.set(x.saturating_add(1), y, Cell { ch: glyph, fg: plain(fg), bg });
            buf.set(x.saturating_add(2), y, Cell { ch: r, fg: plain(cursor_fg), bg });
        }
    }

    let panel_x = GRID_X
        .saturating_add((bounds.cols as u16).saturating_mul(TILE_W))
        .saturating_add(3);
    draw_panel(buf, farm, view, panel_x);
}

fn draw_panel<S: SaveStore>(buf: &mut CellBuffer, farm: &Farm<S>, view: &GroveView, x: u16) {
    let bg = Color::Black;
    let fg = Color::White;
    let hi = Color::Yellow;
    let mut y = 1;

    draw_text(buf, x, y, "Inventory", fg, bg);
    y += 1;
    for sp in farm.registry().dex_order() {
        let n = farm.count(&sp.id);
        let selected = view.selected == Some(sp.id.as_str());
        if n == 0 && !selected {
            continue;
        }
        let line = format!(
            "{} {:<24} x{}",
            if selected { ">" } else { " " },
            sp.display_name,
            n
        );
        draw_text(buf, x, y, &line, if selected { hi } else { fg }, bg);
        y += 1;
    }

    y += 1;
    let mode = if view.removal_mode { "Remove Tree Mode: ON" } else { "Remove Tree Mode: OFF" };
    draw_text(buf, x, y, mode, if view.removal_mode { Color::Red } else { fg }, bg);
    y += 1;
    let race = format!("Race tier: {}", view.difficulty);
    draw_text(buf, x, y, &race, fg, bg);
    y += 2;

    match view.hover {
        Some(info) => {
            draw_text(buf, x, y, &info.display_name, hi, bg);
            let stage = format!("Stage: {}", info.stage.label());
            draw_text(buf, x, y + 1, &stage, fg, bg);
            let next = if info.stage.is_mature() {
                "Fully grown".to_string()
            } else {
                format!("Next: {}", format_remaining(info.remaining_ms))
            };
            draw_text(buf, x, y + 2, &next, fg, bg);
        }
        None => {
            let t = format!("Tile ({}, {})", view.cursor.ix, view.cursor.iy);
            draw_text(buf, x, y, &t, Color::DarkGrey, bg);
        }
    }

    draw_text(buf, 1, buf.h.saturating_sub(2), view.status, Color::Grey, bg);
}

/* -----------------------------
   TreeDex
------------------------------ */

pub(crate) fn draw_dex(buf: &mut CellBuffer, entries: &[DexEntry], scroll: usize, color: bool) {
    let bg = Color::Black;
    let (have, total) = dex::progress(entries);
    let title = format!("TreeDex  {have}/{total} collected");
    draw_text(buf, 2, 1, &title, Color::White, bg);

    let rows = buf.h.saturating_sub(5) as usize;
    for (row, e) in entries.iter().skip(scroll).take(rows).enumerate() {
        let mark = match (e.collected, e.discovered) {
            (true, _) => "[x]",
            (false, true) => "[~]",
            (false, false) => "[ ]",
        };
        let name = if e.collected || e.discovered {
            e.tree_name.clone()
        } else {
            format!("{:02} ???", e.number)
        };
        let line = format!("{mark} {name:<26} {}", e.rarity.label());
        let fg = if !color {
            Color::White
        } else if e.collected {
            rarity_color(e.rarity)
        } else {
            Color::DarkGrey
        };
        draw_text(buf, 2, 3 + row as u16, &line, fg, bg);
    }
}

/* -----------------------------
   Overlays
------------------------------ */

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let (fg, bg) = (Color::White, Color::Black);
    let bw = 60.min(buf.w.saturating_sub(4));
    let bh = 18.min(buf.h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (buf.w - bw) / 2;
    let y0 = (buf.h - bh) / 2;

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let edge_x = x == x0 || x == x0 + bw - 1;
            let edge_y = y == y0 || y == y0 + bh - 1;
            let ch = match (edge_x, edge_y) {
                (true, true) => match (x == x0, y == y0) {
                    (true, true) => '┌',
                    (false, true) => '┐',
                    (true, false) => '└',
                    (false, false) => '┘',
                },
                (true, false) => '│',
                (false, true) => '─',
                (false, false) => ' ',
            };
            buf.set(x, y, Cell { ch, fg, bg });
        }
    }

    draw_text(buf, x0 + 2, y0 + 1, title, fg, bg);
    for (i, line) in body.lines().enumerate() {
        let yy = y0 + 3 + i as u16;
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, fg, bg);
    }
}

pub(crate) fn footer(scene: Scene) -> &'static str {
    match scene {
        Scene::Grove => {
            "arrows move | enter plant/remove | r removal mode | ,/. seed | +/- cheat | w race win | d tier | x dex | h help | q quit"
        }
        Scene::Dex => "TreeDex: up/down scroll | esc back | q quit",
        Scene::Help => "Help: esc back | h close | q quit",
        Scene::ConfirmReset => "Clear save? y yes | any other key cancels",
    }
}
