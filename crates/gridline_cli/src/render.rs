//! Leaderboard rendering of a replay frame, optionally coloured with ANSI
//! escapes.

use crate::config::DisplayConfig;
use gridline_replay::{
    DisplayStatus, DriverView, EventKind, Frame, PositionChange, SectorMark, Timestamp,
    TrackStatus,
};

pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const PROGRESS_BAR_WIDTH: usize = 40;

const POS: usize = 6;
const DRIVER: usize = 7;
const TEAM: usize = 13;
const STATUS: usize = 9;
const PITS: usize = 5;
const TYRE: usize = 8;
const INTERVAL: usize = 10;
const GAP: usize = 10;
const SECTOR: usize = 10;
const PREV_LAP: usize = 10;

const TIMING_WIDTH: usize = INTERVAL + GAP + 3 * SECTOR + PREV_LAP;

const SHORT_TEAM_NAMES: &[(&str, &str)] = &[
    ("Red Bull Racing", "Red Bull"),
    ("Stake F1 Team Kick Sauber", "Sauber"),
    ("Kick Sauber", "Sauber"),
    ("Haas F1 Team", "Haas"),
    ("Racing Bulls", "Racing Bulls"),
];

const SHORT_TYRE_NAMES: &[(&str, &str)] = &[
    ("SOFT", "S"),
    ("MEDIUM", "M"),
    ("HARD", "H"),
    ("INTERMEDIATE", "I"),
    ("WET", "W"),
];

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const FG_WHITE: &str = "\x1b[38;5;15m";
const FG_BLACK: &str = "\x1b[38;5;0m";
const SECTOR_PURPLE: &str = "\x1b[38;5;93m";
const SECTOR_GREEN: &str = "\x1b[38;5;40m";
const SECTOR_YELLOW: &str = "\x1b[38;5;226m";
const DRS_COLOR: &str = "\x1b[38;5;201m";
const PAUSED_STYLE: &str = "\x1b[1m\x1b[38;5;226m";
const FLAG_GREEN: &str = "\x1b[48;5;22m\x1b[38;5;0m";
const FLAG_YELLOW: &str = "\x1b[48;5;226m\x1b[38;5;0m";
const FLAG_RED: &str = "\x1b[48;5;196m\x1b[38;5;15m";

/// Background then foreground per team.
const TEAM_STYLES: &[(&str, &str, &str)] = &[
    ("Mercedes", "\x1b[48;5;36m", FG_BLACK),
    ("Red Bull Racing", "\x1b[48;5;21m", FG_WHITE),
    ("Ferrari", "\x1b[48;5;196m", FG_WHITE),
    ("McLaren", "\x1b[48;5;208m", FG_BLACK),
    ("Aston Martin", "\x1b[48;5;28m", FG_WHITE),
    ("Alpine", "\x1b[48;5;33m", FG_WHITE),
    ("RB", "\x1b[48;5;69m", FG_WHITE),
    ("Williams", "\x1b[48;5;27m", FG_WHITE),
    ("Kick Sauber", "\x1b[48;5;40m", FG_BLACK),
    ("Stake F1 Team Kick Sauber", "\x1b[48;5;40m", FG_BLACK),
    ("Haas F1 Team", "\x1b[48;5;242m", FG_WHITE),
    ("Racing Bulls", "\x1b[48;5;69m", FG_WHITE),
];

/// Keyed by tyre abbreviation.
const TYRE_COLORS: &[(&str, &str)] = &[
    ("S", "\x1b[38;5;196m"),
    ("M", "\x1b[38;5;226m"),
    ("H", "\x1b[38;5;255m"),
    ("I", "\x1b[38;5;40m"),
    ("W", "\x1b[38;5;33m"),
];

pub fn short_team_name(team: &str) -> &str {
    SHORT_TEAM_NAMES
        .iter()
        .find(|(full, _)| *full == team)
        .map_or(team, |(_, short)| short)
}

pub fn tyre_abbreviation(compound: Option<&str>) -> &'static str {
    compound
        .and_then(|c| {
            SHORT_TYRE_NAMES
                .iter()
                .find(|(full, _)| full.eq_ignore_ascii_case(c))
                .map(|(_, short)| *short)
        })
        .unwrap_or("?")
}

fn team_style(team: &str) -> Option<String> {
    TEAM_STYLES
        .iter()
        .find(|(name, _, _)| *name == team)
        .map(|(_, bg, fg)| format!("{bg}{fg}"))
}

fn tyre_color(abbreviation: &str) -> Option<&'static str> {
    TYRE_COLORS
        .iter()
        .find(|(short, _)| *short == abbreviation)
        .map(|(_, color)| *color)
}

fn track_status_style(status: &TrackStatus) -> Option<&'static str> {
    match status {
        TrackStatus::Clear | TrackStatus::VscEnding => Some(FLAG_GREEN),
        TrackStatus::Yellow | TrackStatus::SafetyCar | TrackStatus::VscDeployed => Some(FLAG_YELLOW),
        TrackStatus::Red => Some(FLAG_RED),
        TrackStatus::Unknown(_) => None,
    }
}

fn sector_color(mark: SectorMark) -> &'static str {
    match mark {
        SectorMark::SessionBest => SECTOR_PURPLE,
        SectorMark::PersonalBest => SECTOR_GREEN,
        SectorMark::Normal => SECTOR_YELLOW,
    }
}

fn position_change_color(change: PositionChange) -> &'static str {
    match change {
        PositionChange::Gained => SECTOR_GREEN,
        PositionChange::Lost => SECTOR_PURPLE,
    }
}

/// Applies styles when colour is on. Escapes take no screen columns, so
/// text is padded before it is painted.
#[derive(Clone, Copy, Debug)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(self, text: &str, style: Option<&str>) -> String {
        match style {
            Some(style) if self.enabled => format!("{style}{text}{RESET}"),
            _ => text.to_string(),
        }
    }

    fn cell(self, text: &str, width: usize, style: Option<&str>) -> String {
        self.paint(&format!("{text:<width$}"), style)
    }
}

/// Filled/empty bar for a 0.0 to 1.0 fraction.
pub fn progress_bar(progress: f32) -> String {
    let progress = progress.clamp(0.0, 1.0);
    let filled = (progress * PROGRESS_BAR_WIDTH as f32) as usize;
    format!(
        "Progress: [{}{}] {:.1}%",
        "█".repeat(filled),
        "░".repeat(PROGRESS_BAR_WIDTH - filled),
        progress * 100.0
    )
}

fn sector_cell(palette: Palette, time: Option<Timestamp>, mark: Option<SectorMark>) -> String {
    let Some(time) = time else {
        return palette.cell("", SECTOR, None);
    };
    if palette.enabled {
        return palette.cell(&time.to_string(), SECTOR, mark.map(sector_color));
    }
    let suffix = match mark {
        Some(SectorMark::SessionBest) => "*",
        Some(SectorMark::PersonalBest) => "+",
        Some(SectorMark::Normal) | None => "",
    };
    palette.cell(&format!("{time}{suffix}"), SECTOR, None)
}

/// Sector columns: the sector just completed and those before it on this
/// lap, with the rest taken from the previous lap.
fn sector_cells(palette: Palette, view: &DriverView) -> [String; 3] {
    let state = &view.state;
    let [m1, m2, m3] = view.sector_marks;
    let cell = |time, mark| sector_cell(palette, time, mark);
    match state.last_event_type {
        Some(EventKind::Sector1) => [
            cell(state.s1, Some(m1)),
            cell(state.prev_s2, None),
            cell(state.prev_s3, None),
        ],
        Some(EventKind::Sector2) => [
            cell(state.s1, Some(m1)),
            cell(state.s2, Some(m2)),
            cell(state.prev_s3, None),
        ],
        Some(EventKind::Lap) => [
            cell(state.s1, Some(m1)),
            cell(state.s2, Some(m2)),
            cell(state.s3, Some(m3)),
        ],
        _ => [cell(None, None), cell(None, None), cell(None, None)],
    }
}

fn render_row(index: usize, view: &DriverView, palette: Palette) -> String {
    let state = &view.state;
    let on_track = state.status.is_on_track();

    let pos = if on_track {
        let number = format!("{:>2} ", state.position);
        match view.position_change {
            Some(change) => format!(
                "{number}{}",
                palette.cell(
                    change.symbol(),
                    POS.saturating_sub(number.chars().count()),
                    Some(position_change_color(change)),
                )
            ),
            None => palette.cell(&number, POS, None),
        }
    } else {
        palette.cell("NC", POS, None)
    };
    let team_style = team_style(&view.team);
    let mut row = format!(
        "{pos}{driver:<DRIVER$}{team}{status}",
        driver = state.driver,
        team = palette.cell(short_team_name(&view.team), TEAM, team_style.as_deref()),
        status = palette.cell(&state.display_status.to_string(), STATUS, Some(BOLD)),
    );

    let abbreviation = tyre_abbreviation(state.compound.as_deref());
    let tyre = palette.cell(
        &format!("{:<2} [{:>2}]", abbreviation, state.tyre_life.unwrap_or(0)),
        TYRE,
        tyre_color(abbreviation),
    );

    if !on_track {
        return row;
    }
    if state.display_status == DisplayStatus::Grid {
        row.push_str(&format!("{:<PITS$}{tyre}", ""));
        return row;
    }

    let pits = if state.pit_stops > 0 {
        format!("[{}]", state.pit_stops)
    } else {
        String::new()
    };
    row.push_str(&format!("{pits:<PITS$}{tyre}"));

    if state.last_event_lap < 2 {
        row.push_str(&" ".repeat(TIMING_WIDTH));
        return row;
    }

    let interval = match state.interval {
        Some(interval) if view.drs_eligible && palette.enabled => {
            palette.cell(&interval.to_string(), INTERVAL, Some(DRS_COLOR))
        }
        Some(interval) if view.drs_eligible => palette.cell(&format!("{interval} DRS"), INTERVAL, None),
        Some(interval) => palette.cell(&interval.to_string(), INTERVAL, None),
        None => palette.cell("", INTERVAL, None),
    };
    let gap = if index == 0 {
        "Leader".to_string()
    } else {
        state.gap_to_leader.map_or(String::new(), |gap| format!("+{gap}"))
    };
    let [s1, s2, s3] = sector_cells(palette, view);
    let prev_lap = state
        .previous_lap_time
        .map_or(String::new(), |t| t.to_string());
    row.push_str(&format!(
        "{interval}{gap:<GAP$}{s1}{s2}{s3}{prev_lap:<PREV_LAP$}"
    ));
    row
}

/// Render a full screen for `frame`.
pub fn render(frame: &Frame, race_name: &str, display: &DisplayConfig) -> String {
    let palette = Palette {
        enabled: display.color,
    };
    let mut lines = Vec::with_capacity(frame.ranking.len() + 8);

    let time = if frame.started {
        format!("Time: {}", frame.race_time)
    } else {
        "RACE STARTING".to_string()
    };
    let title = palette.paint(
        &format!("{race_name} | Lap {}/{} | {time}", frame.lap, frame.total_laps),
        Some(BOLD),
    );
    let paused = if frame.playback.paused {
        format!("| {} ", palette.paint("[PAUSED]", Some(PAUSED_STYLE)))
    } else {
        String::new()
    };
    lines.push(format!("{title} {paused}| Speed: {:.2}x", frame.playback.speed));

    let track_status = &frame.conditions.track_status;
    let mut status = vec![
        if palette.enabled {
            palette.paint(&format!(" {track_status} "), track_status_style(track_status))
        } else {
            track_status.label().to_string()
        },
        if frame.conditions.drs_enabled {
            palette.paint("DRS ENABLED", Some(SECTOR_GREEN))
        } else {
            palette.paint("DRS DISABLED", Some(DIM))
        },
    ];
    if frame.conditions.wet {
        status.push(palette.paint("WET TRACK", tyre_color("W")));
    }
    lines.push(status.join(" | "));
    lines.push(progress_bar(frame.progress));

    let header = format!(
        "{:<POS$}{:<DRIVER$}{:<TEAM$}{:<STATUS$}{:<PITS$}{:<TYRE$}{:<INTERVAL$}{:<GAP$}{:<SECTOR$}{:<SECTOR$}{:<SECTOR$}{:<PREV_LAP$}",
        "", "DRIVER", "TEAM", "STATUS", "PITS", "TYRE", "INTERVAL", "GAP", "S1", "S2", "S3", "PREV LAP"
    );
    let rule = "-".repeat(header.chars().count());
    lines.push(header);
    lines.push(rule.clone());

    for (index, view) in frame.ranking.iter().enumerate() {
        lines.push(render_row(index, view, palette).trim_end().to_string());
    }

    lines.push(rule);
    if display.show_controls {
        lines.push(
            "P/Space: Pause | Up/Down: Speed | Left/Right: Skip 10s | 1: 1x | N: Next Lap | Q: Quit"
                .to_string(),
        );
        if palette.enabled {
            lines.push(format!(
                "Sectors: {} session best, {} personal best, {} DRS",
                palette.paint("purple", Some(SECTOR_PURPLE)),
                palette.paint("green", Some(SECTOR_GREEN)),
                palette.paint("pink", Some(DRS_COLOR)),
            ));
        } else {
            lines.push("Sectors: * session best, + personal best".to_string());
        }
    }

    let mut screen = String::new();
    if display.clear_screen {
        screen.push_str(CLEAR_SCREEN);
    }
    screen.push_str(&lines.join("\n"));
    screen.push('\n');
    screen
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridline_replay::{
        Conditions, Entrant, RaceEvent, RaceInfo, ReplayConfig, ReplayEngine, ReplaySession,
    };
    use std::time::Duration;

    fn secs(s: u64) -> Timestamp {
        Timestamp::from_secs(s)
    }

    fn display() -> DisplayConfig {
        DisplayConfig {
            clear_screen: false,
            color: false,
            ..DisplayConfig::default()
        }
    }

    fn engine() -> ReplayEngine {
        let entrant = |driver: &str, team: &str, grid| Entrant {
            driver: driver.to_string(),
            team: team.to_string(),
            grid_position: grid,
            starting_compound: Some("SOFT".to_string()),
            final_status: None,
        };
        let info = RaceInfo {
            name: "Render Grand Prix".to_string(),
            year: Some(2025),
            entrants: vec![
                entrant("VER", "Red Bull Racing", 1),
                entrant("HUL", "Stake F1 Team Kick Sauber", 2),
            ],
        };
        let events = vec![
            RaceEvent::new(secs(0), "VER", 1, 1, EventKind::Sector1),
            RaceEvent::new(secs(90), "VER", 1, 1, EventKind::Lap).with_lap_time(secs(90)),
            RaceEvent::new(secs(95), "HUL", 1, 2, EventKind::PitIn),
            RaceEvent::new(secs(120), "VER", 2, 1, EventKind::Sector1)
                .with_sector_time(secs(30))
                .with_tyre("MEDIUM", 12),
        ];
        let session = ReplaySession::new(info, events, Conditions::default()).unwrap();
        ReplayEngine::new(session, ReplayConfig::default()).unwrap()
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(short_team_name("Haas F1 Team"), "Haas");
        assert_eq!(short_team_name("Ferrari"), "Ferrari");
        assert_eq!(tyre_abbreviation(Some("intermediate")), "I");
        assert_eq!(tyre_abbreviation(Some("HYPERSOFT")), "?");
        assert_eq!(tyre_abbreviation(None), "?");
    }

    #[test]
    fn test_progress_bar() {
        let bar = progress_bar(0.5);
        assert_eq!(bar.matches('█').count(), 20);
        assert_eq!(bar.matches('░').count(), 20);
        assert!(bar.ends_with("50.0%"));
        assert_eq!(progress_bar(2.0).matches('█').count(), PROGRESS_BAR_WIDTH);
    }

    #[test]
    fn test_grid_preview() {
        let engine = engine();
        let screen = render(&engine.preview(), "Render Grand Prix", &display());
        assert!(screen.contains("RACE STARTING"));
        assert!(screen.contains("Red Bull"));
        assert!(screen.contains("Sauber"));
        assert!(screen.contains("GRID"));
        assert!(screen.contains("S  [ 1]"));
        assert!(!screen.starts_with(CLEAR_SCREEN));
    }

    #[test]
    fn test_running_frame() {
        let mut engine = engine();
        engine.control(gridline_replay::ControlAction::TogglePause).unwrap();
        engine.control(gridline_replay::ControlAction::NextLap).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        let frame = engine.frame_after(Duration::ZERO).unwrap();
        let screen = render(&frame, "Render Grand Prix", &display());

        assert!(screen.contains("Lap 2/2"));
        assert!(screen.contains("[PAUSED]"));
        assert!(screen.contains("TRACK CLEAR | DRS DISABLED"));
        assert!(screen.contains("IN PIT"));
        assert!(screen.contains("M  [12]"));
        assert!(screen.contains("Leader"));
        assert!(screen.contains("30.000*"));
        assert!(screen.contains("1:30.000"));
        assert!(screen.contains("Q: Quit"));
    }

    #[test]
    fn test_controls_legend_optional() {
        let engine = engine();
        let config = DisplayConfig {
            show_controls: false,
            clear_screen: true,
            ..DisplayConfig::default()
        };
        let screen = render(&engine.preview(), "Render Grand Prix", &config);
        assert!(screen.starts_with(CLEAR_SCREEN));
        assert!(!screen.contains("Q: Quit"));
    }

    #[test]
    fn test_colour_cues() {
        let mut engine = engine();
        engine.control(gridline_replay::ControlAction::TogglePause).unwrap();
        engine.control(gridline_replay::ControlAction::NextLap).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        engine.control(gridline_replay::ControlAction::SkipForward).unwrap();
        let frame = engine.frame_after(Duration::ZERO).unwrap();
        let colour = DisplayConfig {
            color: true,
            ..display()
        };
        let screen = render(&frame, "Render Grand Prix", &colour);

        // Session-best sector in purple, no text marker.
        assert!(screen.contains(&format!("{SECTOR_PURPLE}30.000")));
        assert!(!screen.contains("30.000*"));
        assert!(screen.contains(&format!("\x1b[48;5;21m{FG_WHITE}Red Bull")));
        assert!(screen.contains(&format!("\x1b[48;5;40m{FG_BLACK}Sauber")));
        assert!(screen.contains("\x1b[38;5;226mM  [12]"));
        assert!(screen.contains(&format!("{FLAG_GREEN} TRACK CLEAR {RESET}")));
        assert!(screen.contains(&format!("{DIM}DRS DISABLED{RESET}")));

        // Same layout once escapes are stripped.
        let plain = render(&frame, "Render Grand Prix", &display());
        assert_eq!(strip_escapes(&screen).lines().count(), plain.lines().count());
        let header = plain.lines().nth(3).unwrap();
        assert!(strip_escapes(&screen).contains(header));
    }

    fn strip_escapes(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_flag_styles() {
        assert_eq!(track_status_style(&TrackStatus::Red), Some(FLAG_RED));
        assert_eq!(track_status_style(&TrackStatus::SafetyCar), Some(FLAG_YELLOW));
        assert_eq!(track_status_style(&TrackStatus::Unknown("9".to_string())), None);
        assert_eq!(team_style("Minardi"), None);
        assert_eq!(tyre_color("?"), None);
    }
}
