use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Grove,
    Dex,
    Help,
    ConfirmReset,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    Move(i32, i32),
    SelectSeed(i32),
    Activate,
    ToggleRemovalMode,
    CheatAdd,
    CheatRemove,
    RaceWin,
    CycleDifficulty,
    NudgeOffset(f64),
    OpenDex,
    Scroll(i32),
    HelpToggle,
    AskReset,
    ConfirmReset,
    Back,
    Quit,
}

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(scene: Scene, ev: &InputEvent) -> Option<Action> {
    if scene == Scene::ConfirmReset {
        return Some(match ev.key {
            KeyCode::Char('y') | KeyCode::Char('Y') => Action::ConfirmReset,
            _ => Action::Back,
        });
    }

    // Global
    if matches!(ev.key, KeyCode::Char('c')) && ev.mods.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match ev.key {
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(Action::HelpToggle),
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        KeyCode::Esc => return Some(Action::Back),
        _ => {}
    }

    match scene {
        Scene::Grove => match ev.key {
            KeyCode::Left => Some(Action::Move(-1, 0)),
            KeyCode::Right => Some(Action::Move(1, 0)),
            KeyCode::Up => Some(Action::Move(0, -1)),
            KeyCode::Down => Some(Action::Move(0, 1)),
            KeyCode::Char(',') => Some(Action::SelectSeed(-1)),
            KeyCode::Char('.') => Some(Action::SelectSeed(1)),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Activate),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::ToggleRemovalMode),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::CheatAdd),
            KeyCode::Char('-') => Some(Action::CheatRemove),
            KeyCode::Char('w') | KeyCode::Char('W') => Some(Action::RaceWin),
            KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::CycleDifficulty),
            KeyCode::Char('[') => Some(Action::NudgeOffset(-10.0)),
            KeyCode::Char(']') => Some(Action::NudgeOffset(10.0)),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::OpenDex),
            KeyCode::Char('C') => Some(Action::AskReset),
            _ => None,
        },
        Scene::Dex => match ev.key {
            KeyCode::Up => Some(Action::Scroll(-1)),
            KeyCode::Down => Some(Action::Scroll(1)),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::Back),
            _ => None,
        },
        Scene::Help | Scene::ConfirmReset => None,
    }
}
