//! Markdown status page projected from a [`GameState`]. The page is never read back.

use std::fmt;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::{GameState, SeasonPhase};

/// Renderable view over the arena.
pub struct StatusPage<'a> {
    state: &'a GameState,
    repository: Option<&'a str>,
}

impl<'a> StatusPage<'a> {
    /// Build a page for `state`; `repository` (`owner/name`) enables the join link.
    pub fn new(state: &'a GameState, repository: Option<&'a str>) -> Self {
        Self { state, repository }
    }
}

/// Render the full status page.
pub fn render_status_page(state: &GameState, repository: Option<&str>) -> String {
    StatusPage::new(state, repository).to_string()
}

impl fmt::Display for StatusPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;
        let phase = SeasonPhase::from(state);

        writeln!(f, "# README Royale")?;
        writeln!(f)?;
        writeln!(
            f,
            "> Last one standing wins. Open an issue to join, survive the daily eliminations."
        )?;
        writeln!(f)?;
        writeln!(f, "## Season {}", state.season)?;
        writeln!(f)?;
        writeln!(f, "**Status:** {} {phase}", phase_badge(phase))?;
        writeln!(f)?;

        if !state.last_event.is_empty() {
            writeln!(f, "**Latest:** {}", escape(&state.last_event))?;
            writeln!(f)?;
        }

        if let Some(winner) = &state.winner {
            writeln!(f, "### Champion")?;
            writeln!(f)?;
            writeln!(
                f,
                ":crown: **{}** is the last one standing in season {}!",
                escape(winner),
                state.season
            )?;
            writeln!(f)?;
        }

        if let Some(due) = state.next_elimination_time.and_then(timestamp) {
            writeln!(f, "**Next elimination:** {due}")?;
            writeln!(f)?;
        }

        writeln!(f, "### Survivors ({})", state.alive.len())?;
        writeln!(f)?;
        write_roster(f, state.alive.iter(), "_Nobody has entered the arena yet._")?;

        writeln!(f, "### Fallen ({})", state.eliminated.len())?;
        writeln!(f)?;
        write_roster(f, state.eliminated.iter(), "_No eliminations so far._")?;

        writeln!(f, "### Hall of fame")?;
        writeln!(f)?;
        if state.winners.is_empty() {
            writeln!(f, "_No season has been won yet._")?;
        } else {
            writeln!(f, "| Season | Winner |")?;
            writeln!(f, "| --- | --- |")?;
            for record in state.winners.iter().rev() {
                writeln!(f, "| {} | {} |", record.season, escape(&record.username))?;
            }
        }
        writeln!(f)?;

        writeln!(f, "### How to join")?;
        writeln!(f)?;
        match self.repository {
            Some(repository) => writeln!(
                f,
                "[Open a join issue](https://github.com/{repository}/issues/new?title=join&body=I%20want%20to%20fight) \
                 while the season is waiting for challengers. The battle begins as soon as a second fighter joins."
            )?,
            None => writeln!(
                f,
                "Open an issue titled `join` while the season is waiting for challengers. \
                 The battle begins as soon as a second fighter joins."
            )?,
        }

        if let Some(last) = state.last_tick_time.and_then(timestamp) {
            writeln!(f)?;
            writeln!(f, "<sub>Last elimination run: {last}</sub>")?;
        }

        Ok(())
    }
}

fn write_roster<'n>(
    f: &mut fmt::Formatter<'_>,
    names: impl ExactSizeIterator<Item = &'n String>,
    empty: &str,
) -> fmt::Result {
    if names.len() == 0 {
        writeln!(f, "{empty}")?;
    } else {
        for (position, name) in names.enumerate() {
            writeln!(f, "{}. {}", position + 1, escape(name))?;
        }
    }
    writeln!(f)
}

fn phase_badge(phase: SeasonPhase) -> &'static str {
    match phase {
        SeasonPhase::Waiting => ":hourglass:",
        SeasonPhase::InProgress => ":crossed_swords:",
        SeasonPhase::Finished => ":trophy:",
    }
}

fn timestamp(value: OffsetDateTime) -> Option<String> {
    value.format(&Rfc3339).ok()
}

/// Escape characters Markdown would otherwise interpret inside free text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '|' | '#' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::normalize;

    #[test]
    fn waiting_page_lists_nothing_yet() {
        let page = render_status_page(&GameState::default(), None);
        assert!(page.starts_with("# README Royale\n"));
        assert!(page.contains("## Season 1"));
        assert!(page.contains(":hourglass: waiting for challengers"));
        assert!(page.contains("_Nobody has entered the arena yet._"));
        assert!(page.contains("_No season has been won yet._"));
        assert!(page.contains("Open an issue titled `join`"));
    }

    #[test]
    fn running_page_shows_rosters_in_order() {
        let state = normalize(json!({
            "season": 2,
            "started": true,
            "alive": ["zed", "amy"],
            "eliminated": ["bob", "cat"],
            "lastEvent": "cat was eliminated. 2 remain.",
            "nextEliminationTime": "2024-05-02T12:00:00Z",
        }));

        let page = render_status_page(&state, Some("o/r"));

        assert!(page.contains(":crossed_swords: battle in progress"));
        assert!(page.contains("### Survivors (2)\n\n1. zed\n2. amy\n"));
        assert!(page.contains("### Fallen (2)\n\n1. bob\n2. cat\n"));
        assert!(page.contains("**Next elimination:** 2024-05-02T12:00:00Z"));
        assert!(page.contains("https://github.com/o/r/issues/new?title=join"));
    }

    #[test]
    fn finished_page_crowns_the_winner_and_lists_history_newest_first() {
        let state = normalize(json!({
            "season": 3,
            "alive": ["amy"],
            "eliminated": ["bob"],
            "winner": "amy",
            "pendingReset": true,
            "winners": [
                { "season": 1, "username": "x" },
                { "season": 3, "username": "amy" },
            ],
        }));

        let page = render_status_page(&state, None);

        assert!(page.contains(":trophy: season finished"));
        assert!(page.contains(":crown: **amy** is the last one standing in season 3!"));
        let newest = page.find("| 3 | amy |").unwrap();
        let oldest = page.find("| 1 | x |").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn markdown_in_names_is_escaped() {
        assert_eq!(escape("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape("line\nbreak"), "line break");
        assert_eq!(escape("plain-name"), "plain-name");
    }
}
