//! Encyclopedia Backfill Tests
//!
//! Backfills a temporary cards folder from an in-memory encyclopedia.

mod helpers;

use artcard_enrich::services::encyclopedia_client::{Area, NamedEntry, RelatedArtist, Relation};
use artcard_enrich::services::{CardStore, EncyclopediaMatcher};
use artcard_enrich::workflow::{BackfillOptions, BackfillOutcome, BackfillWorkflow};
use helpers::*;
use serde_yaml::Value;
use std::path::Path;
use std::sync::Arc;

const METERS_CARD: &str = "---
title: The Meters
genres:
- funk
enhancement_provider: perplexity
external_urls:
  spotify: https://open.spotify.com/artist/meters
---

# The Meters

## Quick Info
- **Genres**: funk
- **Spotify Popularity**: 50/100

## Biography
Funk band.

## Musical Connections

### Key Collaborators
- [[allen_toussaint|Allen Toussaint]] - Producer

## External Links
- [Spotify](https://open.spotify.com/artist/meters)
";

const HAS_DATA_CARD: &str = "---
title: Irma Thomas
musicbrainz_id: mb-irma
---

# Irma Thomas
";

const UNKNOWN_CARD: &str = "---
title: Unknown Act
---

# Unknown Act
";

fn membership(name: &str, attributes: &[&str], begin: Option<&str>, end: Option<&str>) -> Relation {
    Relation {
        relation_type: "member of band".to_string(),
        target_type: "artist".to_string(),
        attributes: attributes.iter().map(|a| a.to_string()).collect(),
        begin: begin.map(str::to_string),
        end: end.map(str::to_string),
        artist: Some(RelatedArtist {
            id: format!("mb-{}", name.len()),
            name: name.to_string(),
        }),
    }
}

fn meters() -> FakeEncyclopedia {
    let mut group = detail("mb-meters", "The Meters", "Group");
    group.begin_area = Some(Area {
        name: "New Orleans".to_string(),
    });
    group.tags = vec![
        NamedEntry {
            name: "funk".to_string(),
        },
        NamedEntry {
            name: "new orleans".to_string(),
        },
    ];
    group.relations = vec![
        membership("Art Neville", &["keyboard", "original"], Some("1965"), None),
        membership("George Porter Jr.", &["bass guitar"], Some("1965"), Some("1977")),
        membership("Leo Nocentelli", &[], None, None),
    ];
    FakeEncyclopedia::default().with(group)
}

fn workflow(
    encyclopedia: &Arc<FakeEncyclopedia>,
    cards_dir: &Path,
    dry_run: bool,
    options: BackfillOptions,
) -> BackfillWorkflow {
    BackfillWorkflow::new(
        EncyclopediaMatcher::new(encyclopedia.clone()),
        CardStore::new(cards_dir.to_path_buf(), dry_run),
        options,
    )
}

#[tokio::test]
async fn test_group_card_gains_members_link_and_tags() {
    // Given: a researched group card without encyclopedia data
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "the_meters.md", METERS_CARD);
    let encyclopedia = Arc::new(meters());
    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());

    // When
    let outcome = backfill.process_card(&dir.path().join("the_meters.md")).await;

    // Then: front matter merged additively
    assert_eq!(outcome, BackfillOutcome::Updated);
    let card = read_card(dir.path(), "the_meters.md");
    assert_eq!(card.get_str("musicbrainz_id"), Some("mb-meters"));
    assert_eq!(card.get_str("artist_type"), Some("group"));
    assert_eq!(card.get_str("origin"), Some("New Orleans"));
    assert_eq!(card.get_str("enhancement_provider"), Some("perplexity"));
    assert!(card.has_value("musicbrainz_enriched_at"));
    let urls = card.get("external_urls").and_then(Value::as_mapping).unwrap();
    assert_eq!(
        urls.get("spotify").and_then(Value::as_str),
        Some("https://open.spotify.com/artist/meters")
    );
    assert_eq!(
        urls.get("musicbrainz").and_then(Value::as_str),
        Some("https://musicbrainz.org/artist/mb-meters")
    );
    assert_eq!(card.get("members").and_then(Value::as_sequence).map(Vec::len), Some(3));

    // ...and the body gained the members section, link and tags
    assert!(card.body.contains(
        "Funk band.\n\n## Members\n- [[art_neville|Art Neville]] - keyboard (from 1965)\n- [[george_porter_jr|George Porter Jr.]] - bass guitar (from 1965 until 1977)\n- [[leo_nocentelli|Leo Nocentelli]]\n"
    ));
    assert!(card.body.contains(
        "### Original Members\n- [[art_neville|Art Neville]] - keyboard\n\n## Musical Connections"
    ));
    assert!(card.body.ends_with(
        "- [Spotify](https://open.spotify.com/artist/meters)\n- [MusicBrainz](https://musicbrainz.org/artist/mb-meters)\n---\n**Tags**: #funk, #new-orleans\n"
    ));
}

#[tokio::test]
async fn test_card_with_encyclopedia_data_is_skipped_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "irma_thomas.md", HAS_DATA_CARD);
    let encyclopedia = Arc::new(FakeEncyclopedia::default().with(detail("mb-irma", "Irma Thomas", "Person")));

    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());
    let outcome = backfill.process_card(&dir.path().join("irma_thomas.md")).await;
    assert_eq!(outcome, BackfillOutcome::SkippedHasData);
    assert_eq!(encyclopedia.searches(), 0);

    let forced = BackfillOptions {
        force: true,
        ..Default::default()
    };
    let mut backfill = workflow(&encyclopedia, dir.path(), false, forced);
    let outcome = backfill.process_card(&dir.path().join("irma_thomas.md")).await;
    assert_eq!(outcome, BackfillOutcome::Updated);
    assert_eq!(encyclopedia.searches(), 1);
}

#[tokio::test]
async fn test_unmatched_card_is_left_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "unknown_act.md", UNKNOWN_CARD);
    let encyclopedia = Arc::new(meters());
    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());

    let outcome = backfill.process_card(&dir.path().join("unknown_act.md")).await;

    assert!(matches!(outcome, BackfillOutcome::SkippedNoMatch { .. }));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("unknown_act.md")).unwrap(),
        UNKNOWN_CARD
    );
}

#[tokio::test]
async fn test_low_confidence_match_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "the_meters.md", METERS_CARD);
    let encyclopedia = Arc::new(meters().with_score("The Meters", 90));
    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());

    let outcome = backfill.process_card(&dir.path().join("the_meters.md")).await;

    match outcome {
        BackfillOutcome::SkippedNoMatch { reason } => assert!(reason.contains("76%")),
        other => panic!("expected a skipped card, got {:?}", other),
    }
    assert_eq!(backfill.statistics().skipped_no_match, 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("the_meters.md")).unwrap(),
        METERS_CARD
    );
}

#[tokio::test]
async fn test_run_statistics_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "irma_thomas.md", HAS_DATA_CARD);
    write_card(dir.path(), "the_meters.md", METERS_CARD);
    write_card(dir.path(), "unknown_act.md", UNKNOWN_CARD);
    let encyclopedia = Arc::new(meters());

    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());
    let stats = backfill.run().await.unwrap().clone();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.updated, 1);
    assert_eq!(stats.skipped_has_data, 1);
    assert_eq!(stats.skipped_no_match, 1);
    assert_eq!(stats.errors, 0);

    let limited = BackfillOptions {
        limit: Some(1),
        ..Default::default()
    };
    let mut backfill = workflow(&encyclopedia, dir.path(), false, limited);
    let stats = backfill.run().await.unwrap().clone();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.processed, 1);
}

#[tokio::test]
async fn test_dry_run_leaves_cards_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "the_meters.md", METERS_CARD);
    let encyclopedia = Arc::new(meters());
    let mut backfill = workflow(&encyclopedia, dir.path(), true, BackfillOptions::default());

    let outcome = backfill.process_card(&dir.path().join("the_meters.md")).await;

    assert_eq!(outcome, BackfillOutcome::Updated);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("the_meters.md")).unwrap(),
        METERS_CARD
    );
}

#[tokio::test]
async fn test_malformed_card_counts_as_error() {
    let dir = tempfile::tempdir().unwrap();
    write_card(dir.path(), "broken.md", "# No front matter\n");
    let encyclopedia = Arc::new(meters());
    let mut backfill = workflow(&encyclopedia, dir.path(), false, BackfillOptions::default());

    let stats = backfill.run().await.unwrap().clone();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.updated, 0);
}
