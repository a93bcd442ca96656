use crate::input::{collect_input_nonblocking, map_event_to_action, Action, Scene};
use crate::render::{
    draw_center_box, draw_dex, draw_grove, draw_text, footer, GroveView, Terminal,
};
use crossterm::style::Color;
use isogrove::config::{load_settings, project_paths, save_settings_atomic, Paths, Settings};
use isogrove::reward::{self, Difficulty};
use isogrove::stage::now_ms;
use isogrove::storage::FileStore;
use isogrove::{dex, logging, Farm, PlantInfo, Registry, Tile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const HELP: &str = "Grow trees on the grid. Seeds sprout, grow, then mature.\n\
A mature tree is recorded in the TreeDex.\n\n\
Arrows move the cursor, , and . pick a seed.\n\
Enter plants the picked seed (Yggdrasil needs 2x2).\n\
R toggles removal mode; Enter then digs up a tree\n\
and returns its seed.\n\n\
+/- cheat seeds, W wins a race for a random seed\n\
of the current tier (D cycles tiers).\n\
[ and ] shift the grid, X opens the TreeDex,\n\
Shift+C clears the save. Esc or H closes help.";

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    farm: Farm<FileStore>,
    term: Terminal,
    rng: StdRng,
    scene: Scene,
    cursor: Tile,
    selected: usize,
    removal_mode: bool,
    difficulty: Difficulty,
    dex_scroll: usize,
    hover: Option<PlantInfo>,
    hover_refresh_at: Instant,
    status: String,
    should_quit: bool,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let settings = load_settings(&paths.settings_path);
        logging::init(&paths.log_path, &settings.log_filter)?;

        let store = FileStore::in_dir(&paths.data_dir);
        info!(path = %store.path().display(), "opening grove");
        let farm = Farm::open(Registry::builtin(), settings.grid_bounds(), store);

        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            paths,
            farm,
            term,
            rng: StdRng::from_entropy(),
            scene: Scene::Grove,
            cursor: Tile::new(0, 0),
            selected: 0,
            removal_mode: false,
            difficulty: Difficulty::Easy,
            dex_scroll: 0,
            hover: None,
            hover_refresh_at: Instant::now(),
            status: String::new(),
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let hover_every = Duration::from_millis(self.settings.hover_refresh_ms.max(50));

        while !self.should_quit {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(self.scene, &ev) {
                    self.apply(action);
                    self.hover_refresh_at = Instant::now();
                }
                if self.should_quit {
                    break;
                }
            }

            // Fixed-interval refresh: notices newly mature trees and updates
            // the hover countdown.
            if Instant::now() >= self.hover_refresh_at {
                let now = now_ms();
                self.farm.observe_all(now);
                self.hover = self.farm.inspect(self.cursor, now);
                self.hover_refresh_at = Instant::now() + hover_every;
            }

            self.render_frame()?;
            spin_sleep(frame_dt, Instant::now());
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn selected_species(&self) -> Option<String> {
        self.farm
            .registry()
            .dex_order()
            .get(self.selected)
            .map(|sp| sp.id.clone())
    }

    fn apply(&mut self, action: Action) {
        let now = now_ms();
        match action {
            Action::Move(dx, dy) => {
                let b = self.farm.bounds();
                self.cursor = Tile::new(
                    (self.cursor.ix + dx).clamp(0, b.cols - 1),
                    (self.cursor.iy + dy).clamp(0, b.rows - 1),
                );
            }
            Action::SelectSeed(delta) => {
                let n = self.farm.registry().dex_order().len() as i32;
                if n > 0 {
                    self.selected = (self.selected as i32 + delta).rem_euclid(n) as usize;
                }
            }
            Action::Activate if self.removal_mode => {
                self.status = match self.farm.remove_at(self.cursor, now) {
                    Ok(r) if r.retracted => format!("Removed {} (TreeDex removed)", r.plant.species),
                    Ok(r) => format!("Removed {} (TreeDex kept)", r.plant.species),
                    Err(e) => e.to_string(),
                };
            }
            Action::Activate => {
                if let Some(species) = self.selected_species() {
                    self.status = match self.farm.place(&species, self.cursor, now) {
                        Ok(()) => format!("Planted {species}"),
                        Err(e) => e.to_string(),
                    };
                }
            }
            Action::ToggleRemovalMode => self.removal_mode = !self.removal_mode,
            Action::CheatAdd => {
                if let Some(species) = self.selected_species() {
                    self.farm.add_seeds(&species, 1);
                }
            }
            Action::CheatRemove => {
                if let Some(species) = self.selected_species() {
                    self.farm.remove_seeds(&species, 1);
                }
            }
            Action::RaceWin => {
                // The race writes through its own handle, like a separate page.
                let mut race_store = self.farm.store().clone();
                match reward::award_win(
                    &mut race_store,
                    self.farm.registry(),
                    self.difficulty,
                    &mut self.rng,
                ) {
                    Ok(Some(species)) => {
                        self.farm.reload();
                        self.status = format!("Race won: +1 {species}");
                    }
                    Ok(None) => self.status = "No seeds in this tier".to_string(),
                    Err(e) => {
                        warn!("race reward failed: {e:#}");
                        self.status = "Race reward could not be saved".to_string();
                    }
                }
            }
            Action::CycleDifficulty => self.difficulty = self.difficulty.next(),
            Action::NudgeOffset(dy) => {
                let y = (self.farm.record().settings.grid_offset_y + dy).clamp(0.0, 1000.0);
                self.farm.set_grid_offset(y);
            }
            Action::OpenDex => {
                self.dex_scroll = 0;
                self.scene = Scene::Dex;
            }
            Action::Scroll(d) => {
                self.dex_scroll = (self.dex_scroll as i32 + d).max(0) as usize;
            }
            Action::HelpToggle => {
                self.scene = match self.scene {
                    Scene::Help => Scene::Grove,
                    _ => Scene::Help,
                };
            }
            Action::AskReset => self.scene = Scene::ConfirmReset,
            Action::ConfirmReset => {
                self.farm.reset();
                self.status = "Save cleared".to_string();
                self.scene = Scene::Grove;
            }
            Action::Back => self.scene = Scene::Grove,
            Action::Quit => self.should_quit = true,
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = Color::Black;
        self.term.cur.clear(bg);
        let now = now_ms();

        match self.scene {
            Scene::Dex => {
                let entries = dex::entries(self.farm.registry(), self.farm.record(), now);
                self.dex_scroll = self.dex_scroll.min(entries.len().saturating_sub(1));
                draw_dex(&mut self.term.cur, &entries, self.dex_scroll, self.settings.enable_color);
            }
            _ => {
                let selected = self.selected_species();
                let offset = self.farm.record().settings.grid_offset_y.clamp(0.0, 1000.0);
                let grid_y = 1 + (offset / 50.0).round() as u16;
                let view = GroveView {
                    cursor: self.cursor,
                    removal_mode: self.removal_mode,
                    grid_y,
                    hover: self.hover.as_ref(),
                    selected: selected.as_deref(),
                    difficulty: self.difficulty.label(),
                    status: &self.status,
                    color: self.settings.enable_color,
                    now,
                };
                draw_grove(&mut self.term.cur, &self.farm, &view);
            }
        }

        match self.scene {
            Scene::Help => draw_center_box(&mut self.term.cur, "How to play", HELP),
            Scene::ConfirmReset => draw_center_box(
                &mut self.term.cur,
                "Clear save?",
                "Every plant, seed and TreeDex entry will be lost.\n\nPress Y to confirm.",
            ),
            _ => {}
        }

        let h = self.term.cur.h.saturating_sub(1);
        draw_text(&mut self.term.cur, 1, h, footer(self.scene), Color::White, bg);

        self.term.present()?;
        Ok(())
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    app.run()?;
    Ok(())
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
