use std::{fs::File, io::BufReader, ops::Range, path::Path};

use rand::Rng;

use crate::{
    core::FrameIndex,
    error::{TrailreelError, TrailreelResult},
};

/// One riding story: the title doubles as the artifact file name, the
/// narrative supplies the animated word stream.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoryCard {
    pub title: String,
    pub narrative: String,
}

impl StoryCard {
    pub fn validate(&self) -> TrailreelResult<()> {
        if self.title.trim().is_empty() {
            return Err(TrailreelError::validation("story title must be non-empty"));
        }
        if self.narrative.trim().is_empty() {
            return Err(TrailreelError::validation(
                "story narrative must be non-empty",
            ));
        }
        Ok(())
    }

    /// Narrative words in display order.
    pub fn words(&self) -> Vec<String> {
        self.narrative
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

fn card(title: &str, narrative: &str) -> StoryCard {
    StoryCard {
        title: title.to_string(),
        narrative: narrative.to_string(),
    }
}

/// The built-in catalog of riding stories.
pub fn builtin_cards() -> Vec<StoryCard> {
    vec![
        card(
            "Epic Mountain Trail Adventure - Kids Bike Safety",
            "Alex gears up for mountain trail adventure! Helmet on, knee pads secure. Safety first!",
        ),
        card(
            "BMX Tricks and Stunts - Safe Riding for Kids",
            "BMX tricks time! Watch our rider perform safe stunts with proper protective gear.",
        ),
        card(
            "Forest Trail Challenge - Mountain Biking Fun",
            "Forest trail challenge! Navigating rocks and roots while staying safe and having fun.",
        ),
        card(
            "Pump Track Mastery - Kids Bike Skills",
            "Pump track mastery! Using body weight to gain speed and maintain perfect balance.",
        ),
        card(
            "Dirt Jumping Adventure - Safe Stunts for Kids",
            "Dirt jumping adventure! Controlled stunts with full safety equipment and smooth landings.",
        ),
        card(
            "Urban Bike Tricks - City Riding Fun",
            "Urban bike skills! City riding with ramps, stairs, and safe trick performances.",
        ),
        card(
            "Desert Trail Adventure - Kids Mountain Biking",
            "Desert trail exploration! Sand dunes, cacti, and sunset riding with proper gear.",
        ),
        card(
            "Coastal Bike Adventure - Ocean Trail Fun",
            "Coastal bike adventure! Cliffside trails with ocean views and safety first approach.",
        ),
        card(
            "Night Riding Adventure - Kids Bike Safety",
            "Night riding safety! Headlights, reflective gear, and proper trail navigation.",
        ),
        card(
            "Mountain Summit Challenge - Kids Adventure",
            "Mountain summit challenge! Uphill climb with determination and downhill thrill ride.",
        ),
    ]
}

/// Load a catalog from a JSON array of `{ "title", "narrative" }` objects.
pub fn load_cards(path: &Path) -> TrailreelResult<Vec<StoryCard>> {
    let f = File::open(path)?;
    let cards: Vec<StoryCard> = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
        TrailreelError::serde(format!("failed to parse story file '{}': {e}", path.display()))
    })?;
    if cards.is_empty() {
        return Err(TrailreelError::validation(format!(
            "story file '{}' contains no cards",
            path.display()
        )));
    }
    for c in &cards {
        c.validate()?;
    }
    Ok(cards)
}

/// Pick one card uniformly with the caller's random source.
pub fn pick_card<'a, R: Rng + ?Sized>(
    cards: &'a [StoryCard],
    rng: &mut R,
) -> TrailreelResult<&'a StoryCard> {
    if cards.is_empty() {
        return Err(TrailreelError::validation("story catalog is empty"));
    }
    Ok(&cards[rng.gen_range(0..cards.len())])
}

/// Which narrative words are visible in `frame`.
///
/// An 8-word window that starts advancing one word per frame from frame 5.
/// Both bounds clamp to the word count, so late frames of a short narrative
/// yield an empty range.
pub fn word_window(word_count: usize, frame: FrameIndex) -> Range<usize> {
    let raw_start = (frame.0 as usize).saturating_sub(5);
    let start = raw_start.min(word_count);
    let end = (raw_start.saturating_add(8)).min(word_count);
    start..end
}

/// Reduce a title to a filesystem-safe stem: keep ASCII alphanumerics,
/// hyphens, and whitespace, then collapse each whitespace run to one space.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_space = false;
    for c in title.chars() {
        if c.is_ascii_whitespace() {
            pending_space = !out.is_empty() || pending_space;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '-') {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}
