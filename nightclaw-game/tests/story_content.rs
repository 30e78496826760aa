use nightclaw_game::constants::{DEFEAT_NODE_ID, ENTRY_NODE_ID, RESUME_SENTINEL, VICTORY_NODE_ID};
use nightclaw_game::events::{BEAR_EVENT, BLIZZARD_EVENT};
use nightclaw_game::{BundledContent, StoryGraph, StoryLoader};

fn bundled() -> StoryGraph {
    StoryGraph::bundled().unwrap()
}

#[test]
fn bundled_story_validates_clean() {
    let graph = bundled();
    assert!(graph.validate().is_empty(), "{:?}", graph.validate());
    assert_eq!(graph.len(), 59);
    assert!(BundledContent.load_story().is_ok());
}

#[test]
fn every_level_and_ending_is_present() {
    let graph = bundled();
    for level in 1..=30 {
        assert!(graph.contains(level), "level {level} missing");
    }
    for id in [ENTRY_NODE_ID, DEFEAT_NODE_ID, VICTORY_NODE_ID] {
        assert!(graph.contains(id));
    }
    for id in [DEFEAT_NODE_ID, VICTORY_NODE_ID] {
        assert!(graph.lookup(id).unwrap().choices.is_empty());
    }
}

#[test]
fn intro_has_five_lines() {
    let graph = bundled();
    assert_eq!(graph.intro().len(), 5);
    assert!(graph.intro()[0].starts_with("In the heart of a vast forest"));
    assert_eq!(
        graph.intro()[4],
        "You are Alex. Alone. Vulnerable. You must survive."
    );
}

#[test]
fn event_branches_end_in_the_resume_sentinel() {
    let graph = bundled();
    for event in [BLIZZARD_EVENT, BEAR_EVENT] {
        let node = graph.lookup(event).unwrap();
        assert_eq!(node.choices.len(), 2);
        for choice in &node.choices {
            let branch = graph.lookup(choice.target).unwrap();
            assert!(
                branch
                    .choices
                    .iter()
                    .all(|choice| choice.target == RESUME_SENTINEL),
                "branch {} does not resume",
                branch.id
            );
        }
    }
}

#[test]
fn boss_nodes_grant_meat_and_herbs() {
    let graph = bundled();
    for id in [9021, 2001] {
        assert_eq!(graph.lookup(id).unwrap().rewards, ["Meat", "Herbs"]);
    }
    assert_eq!(graph.lookup(102).unwrap().reward_item(), Some("Meat"));
    assert_eq!(graph.lookup(302).unwrap().reward_item(), Some("Herbs"));
}

#[test]
fn feast_node_requires_meat() {
    let graph = bundled();
    let feast = graph.lookup(501).unwrap();
    assert_eq!(feast.required_item.as_deref(), Some("Meat"));
    assert_eq!(feast.delta.health, 20);
    assert_eq!(feast.delta.hunger, -35);
}

#[test]
fn slideshows_keep_display_order() {
    let graph = bundled();
    assert_eq!(
        graph.lookup(30).unwrap().slideshow,
        ["30(b).png", "30 (c).png", "30 (d).png"]
    );
    assert_eq!(graph.lookup(2001).unwrap().slideshow.len(), 3);
    assert_eq!(
        graph.lookup(9021).unwrap().slideshow,
        ["bear (c).png", "bear (d).png"]
    );
}

#[test]
fn shared_copy_matches_fresh_parse() {
    let shared = StoryGraph::bundled_shared().unwrap();
    assert_eq!(shared, &bundled());
}
