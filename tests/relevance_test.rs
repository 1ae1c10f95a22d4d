mod helpers;

use helpers::statement;
use watson::investigation::contradiction::SharedContext;
use watson::investigation::relevance::{rank_candidates, relevance_score, DEFAULT_THRESHOLD};

fn household() -> Vec<watson::investigation::types::TrackedStatement> {
    vec![
        statement("thomas", "Where were you at 11:15?", "I was in the library at 11:15."),
        statement("james", "Did you see anyone?", "I saw Master Thomas near the study at 11:15."),
        statement("victoria", "How did you feel about him?", "Our marriage was a cold one."),
        statement("eleanor", "Tell me about the ledger.", "I know nothing about any ledger."),
        statement("thomas", "What time did you go to bed?", "Around midnight, I think."),
        statement("marcus", "Where were you at 11:15?", "I was in the drawing room at 11:15 with Lady Ashford."),
    ]
}

#[test]
fn relevance_is_symmetric() {
    let all = household();
    for a in &all {
        for b in &all {
            assert_eq!(relevance_score(a, b), relevance_score(b, a));
        }
    }
}

#[test]
fn shared_time_and_topic_outrank_unrelated_testimony() {
    let all = household();
    let whereabouts = relevance_score(&all[0], &all[5]);
    let unrelated = relevance_score(&all[0], &all[2]);
    assert!(whereabouts >= DEFAULT_THRESHOLD);
    assert!(whereabouts > unrelated);
}

#[test]
fn shortlist_skips_the_speaker() {
    let all = household();
    let new = statement("thomas", "Where were you at 11:15?", "I was in the study at 11:15.");
    let ranked = rank_candidates(&new, &all, 0.0, 10);

    assert!(ranked.iter().all(|c| c.statement.character_id != "thomas"));
    assert_eq!(ranked.len(), 4);
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn shortlist_respects_threshold_and_cap() {
    let all = household();
    let new = statement("eleanor", "Where were you at 11:15?", "I was in the hallway at 11:15.");

    let capped = rank_candidates(&new, &all, 0.0, 2);
    assert_eq!(capped.len(), 2);

    let strict = rank_candidates(&new, &all, DEFAULT_THRESHOLD, 10);
    assert!(strict.iter().all(|c| c.score >= DEFAULT_THRESHOLD));
    assert!(strict.iter().any(|c| c.statement.character_id == "marcus"));
    assert!(strict.iter().all(|c| c.statement.character_id != "eleanor"));
}

#[test]
fn one_clock_time_counts_once() {
    let thomas = statement("thomas", "When did you hear it?", "I heard the clock strike at 11:30 PM.");
    let late = statement("james", "When did you hear it?", "I heard the clock strike at 11:30 PM.");
    let early = statement("james", "When did you hear it?", "I heard the clock strike at 11:30 AM.");

    assert_eq!(thomas.entities.times.len(), 1);
    assert_eq!(SharedContext::between(&thomas, &late).times, vec!["11:30 pm"]);
    assert!(SharedContext::between(&thomas, &early).times.is_empty());
    assert_eq!(
        relevance_score(&thomas, &late) - relevance_score(&thomas, &early),
        1.0
    );
}
