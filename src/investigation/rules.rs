//! Declarative pattern tables for statement extraction.
//!
//! Every table is plain `(pattern, label)` data compiled once. The traversal lives
//! in the reducers at the bottom ([`first_label`], [`all_labels`], [`count_matches`],
//! [`any_match`]) so rule sets can be tested and extended independently.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::types::{ClaimType, Mood, Topic};

/// A compiled rule mapping a pattern to a canonical label.
pub struct LabelRule<L> {
    pub regex: Regex,
    pub label: L,
}

/// Compile a table, dropping patterns that fail to compile.
pub fn compile<L: Clone>(table: &[(&str, L)]) -> Vec<LabelRule<L>> {
    table
        .iter()
        .filter_map(|(pattern, label)| {
            match Regex::new(pattern) {
                Ok(regex) => Some(LabelRule {
                    regex,
                    label: label.clone(),
                }),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "skipping invalid extraction pattern");
                    None
                }
            }
        })
        .collect()
}

// ── Topics (ordered, first match wins) ──────────────────────────────────────

pub static TOPIC_RULES: LazyLock<Vec<LabelRule<Topic>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bwhere (?:were|was|did) you\b|\bwhereabouts\b|\bwhere had you\b", Topic::Whereabouts),
        (r"(?i)\bwhat time\b|\bwhen did\b|\bwhen was\b|\bhow long\b|\btimeline\b|\bat what point\b", Topic::Timeline),
        (r"(?i)\brelationship\b|\bget along\b|\bhow well did you know\b|\bfeel about (?:him|her)\b|\bmarri(?:ed|age)\b", Topic::Relationship),
        (r"(?i)\bwhat did you do\b|\bwhat were you doing\b|\bdid you (?:go|leave|take|enter|touch)\b", Topic::Actions),
        (r"(?i)\bdo you know\b|\bdid you know\b|\bwere you aware\b|\btell me about\b", Topic::Knowledge),
        (r"(?i)\bdid you (?:see|hear|notice)\b|\bwhat did you (?:see|hear|notice)\b|\banything unusual\b|\bwitness", Topic::Observations),
        (r"(?i)\bdo you own\b|\bbelong(?:s|ed)? to\b|\bin your possession\b|\bwhose (?:key|knife|letter)\b", Topic::Possessions),
        (r"(?i)\bhow (?:do|did) you feel\b|\bupset\b|\bgrief\b|\bafraid\b", Topic::Emotions),
        (r"(?i)\bmotive\b|\bwhy would\b|\bbenefit\b|\binherit|\bthe will\b", Topic::Motive),
        (r"(?i)\bsecret\b|\bhiding\b|\bthe truth\b|\blying\b|\blied\b", Topic::Secrets),
    ])
});

/// Topic groups considered related for relevance scoring. Membership is
/// symmetric: two distinct topics are related iff some group holds both.
pub const RELATED_TOPICS: &[&[Topic]] = &[
    &[Topic::Whereabouts, Topic::Timeline, Topic::Actions, Topic::Observations],
    &[Topic::Relationship, Topic::Motive, Topic::Secrets],
];

pub fn topics_related(a: Topic, b: Topic) -> bool {
    a != b && RELATED_TOPICS.iter().any(|g| g.contains(&a) && g.contains(&b))
}

// ── Entities ────────────────────────────────────────────────────────────────

pub static PLACE_RULES: LazyLock<Vec<LabelRule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bstudy\b", "study"),
        (r"(?i)\blibrary\b", "library"),
        (r"(?i)\bkitchen\b", "kitchen"),
        (r"(?i)\bgardens?\b", "garden"),
        (r"(?i)\bballroom\b", "ballroom"),
        (r"(?i)\bdining (?:room|hall)\b", "dining room"),
        (r"(?i)\bdrawing room\b|\bparlou?r\b", "drawing room"),
        (r"(?i)\bconservatory\b", "conservatory"),
        (r"(?i)\bbed ?room\b|\bmy room\b|\bchambers?\b", "bedroom"),
        (r"(?i)\bhall(?:way)?\b|\bcorridor\b|\bstair(?:s|case)\b", "hallway"),
        (r"(?i)\bcellar\b|\bwine cellar\b", "cellar"),
        (r"(?i)\bterrace\b|\bbalcony\b", "terrace"),
        (r"(?i)\bstables?\b", "stables"),
        (r"(?i)\bservants'? quarters\b|\bpantry\b", "servants' quarters"),
        (r"(?i)\bfront door\b|\bentrance\b|\bfoyer\b", "entrance"),
        (r"(?i)\bvillage\b|\bthe pub\b|\btown\b", "village"),
    ])
});

pub static OBJECT_RULES: LazyLock<Vec<LabelRule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bknife\b|\bdagger\b|\bletter opener\b", "knife"),
        (r"(?i)\bcandlestick\b", "candlestick"),
        (r"(?i)\bpoison\b|\barsenic\b|\bvial\b", "poison"),
        (r"(?i)\b(?:revolver|pistol|gun)\b", "gun"),
        (r"(?i)\bletters?\b|\bnote\b", "letter"),
        (r"(?i)\bwill\b(?:\s+and\s+testament)?|\btestament\b", "will"),
        (r"(?i)\bkeys?\b", "key"),
        (r"(?i)\bledgers?\b|\baccounts? book\b", "ledger"),
        (r"(?i)\bglass(?:es)?\b|\bdecanter\b|\bbrandy\b|\bwhisk(?:e)?y\b", "glass"),
        (r"(?i)\bnecklace\b|\bjewel(?:ry|lery|s)?\b|\bring\b", "jewelry"),
        (r"(?i)\bmedicine\b|\bpills?\b|\blaudanum\b|\bsleeping draught\b", "medicine"),
        (r"(?i)\bclock\b|\bpocket ?watch\b", "clock"),
        (r"(?i)\bsafe\b", "safe"),
    ])
});

/// Clock times are labelled by their normalised matched text (label `None`);
/// named times carry a fixed label.
pub static TIME_RULES: LazyLock<Vec<LabelRule<Option<&'static str>>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\b(?:1[0-2]|0?[1-9])(?::[0-5]\d)?\s*(?:[ap]m\b|[ap]\.m\.)", None),
        (r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b", None),
        (r"(?i)\b(?:one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve) o'?clock\b", None),
        (r"(?i)\bmidnight\b", Some("midnight")),
        (r"(?i)\bquarter past eleven\b", Some("11:15")),
        (r"(?i)\bhalf past eleven\b", Some("11:30")),
        (r"(?i)\bafter dinner\b", Some("after dinner")),
        (r"(?i)\b(?:that|last) night\b", Some("that night")),
        (r"(?i)\bthis evening\b|\bthe evening\b", Some("evening")),
        (r"(?i)\bdawn\b|\bthis morning\b|\bbreakfast\b", Some("morning")),
    ])
});

/// Normalise a matched time token: lowercase, no dots, single spaces.
pub fn normalize_time(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('.', "");
    let mut out = String::with_capacity(lowered.len());
    for part in lowered.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(part);
    }
    // "11:30pm" and "11:30 pm" are the same time
    for suffix in ["am", "pm"] {
        if let Some(stem) = out.strip_suffix(suffix) {
            if !stem.ends_with(' ') {
                return format!("{stem} {suffix}");
            }
        }
    }
    out
}

/// Find every time token in `text`, normalised. Rules run in table order and a
/// span claimed by an earlier rule is not matched again, so "11:30 pm" never
/// also yields a bare "11:30".
pub fn extract_times(text: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    for rule in TIME_RULES.iter() {
        for m in rule.regex.find_iter(text) {
            if claimed.iter().any(|&(s, e)| m.start() < e && s < m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));
            let label = match rule.label {
                Some(fixed) => fixed.to_string(),
                None => normalize_time(m.as_str()),
            };
            found.insert(label);
        }
    }
    found
}

/// The most specific token of a set: clock times before named times, then the
/// longest.
pub fn primary_time(times: &BTreeSet<String>) -> Option<String> {
    times
        .iter()
        .max_by_key(|t| (t.chars().any(|c| c.is_ascii_digit()), t.len()))
        .cloned()
}

// ── Claims ──────────────────────────────────────────────────────────────────

/// A claim probe: one pattern per claim kind, object in capture group 1 when the
/// probe has one.
pub struct ClaimProbe {
    pub claim_type: ClaimType,
    pub predicate: &'static str,
    pub regex: Regex,
}

const NEG: &str = r"(?:(?:was|were|did|do|had|have)\s*(?:n't|not)\s+|never\s+)?";

pub static CLAIM_PROBES: LazyLock<Vec<ClaimProbe>> = LazyLock::new(|| {
    let table: [(ClaimType, &'static str, String); 6] = [
        (
            ClaimType::Location,
            "was_in",
            format!(
                r"(?i)\bI\s+(?:(?:was|were)(?:n't|\s+not|\s+never)?|{NEG}(?:go|went|stay|stayed|remained)|had\s+(?:gone|been))\s+(?:\w+\s+)?(?:in|at|to|inside|near|into)\s+(?:the\s+|my\s+|his\s+|her\s+)?([a-z']+(?:\s+(?:room|hall|quarters|door))?)"
            ),
        ),
        (
            ClaimType::Time,
            "at_time",
            r"(?i)\b(?:at|around|about|until|till|before|after|by|since)\s+((?:1[0-2]|0?[1-9])(?::[0-5]\d)?\s*(?:[ap]m\b|[ap]\.m\.)|(?:[01]?\d|2[0-3]):[0-5]\d|midnight|(?:one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve) o'?clock)"
                .to_string(),
        ),
        (
            ClaimType::Witness,
            "saw",
            format!(r"(?i)\bI\s+{NEG}(?:saw|see|noticed|notice|watched|spotted|observed)\s+([^.,;!?]+)"),
        ),
        (
            ClaimType::Witness,
            "heard",
            format!(r"(?i)\bI\s+{NEG}(?:heard|hear|overheard)\s+([^.,;!?]+)"),
        ),
        (
            ClaimType::Knowledge,
            "knew",
            format!(
                r"(?i)\bI\s+{NEG}(?:know|knew|was aware|realized|realised|found out|learned)\s+(?:that\s+|about\s+|of\s+)?([^.,;!?]*)"
            ),
        ),
        (
            ClaimType::Action,
            "did",
            format!(
                r"(?i)\bI\s+{NEG}(left|took|gave|opened|closed|locked|unlocked|poured|brought|returned|spoke|argued|walked|ran|entered|touched|fetched|knocked)\b([^.,;!?]*)"
            ),
        ),
    ];
    table
        .into_iter()
        .filter_map(|(claim_type, predicate, pattern)| {
            Regex::new(&pattern).ok().map(|regex| ClaimProbe {
                claim_type,
                predicate,
                regex,
            })
        })
        .collect()
});

pub static NEGATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnot\b|n't\b|\bnever\b|\bno one\b|\bnobody\b").ok()
});

/// True when a clause carries a negation marker.
pub fn is_negated(clause: &str) -> bool {
    NEGATION.as_ref().is_some_and(|re| re.is_match(clause))
}

// ── Emotion families (priority order) ───────────────────────────────────────

pub static EMOTION_FAMILIES: LazyLock<Vec<(Mood, Vec<LabelRule<&'static str>>)>> =
    LazyLock::new(|| {
        vec![
            (
                Mood::Nervous,
                compile(&[
                    (r"\*[^*]*(?:fidget|trembl|shak|stammer|wring|glanc|swallow|sweat)[^*]*\*", "nervous stage direction"),
                    (r"(?i)\b(?:um+|uh+|er+m?)\b", "filler words"),
                    (r"(?i)\bi-i\b|\bw-w|\bh-h", "stammering"),
                    (r"(?i)\bnervous\b|\banxious\b|\bon edge\b", "admits nerves"),
                ]),
            ),
            (
                Mood::Fearful,
                compile(&[
                    (r"(?i)\bafraid\b|\bscared\b|\bterrified\b|\bfrightened\b", "expresses fear"),
                    (r"\*[^*]*(?:flinch|cower|pale|recoil)[^*]*\*", "fearful stage direction"),
                ]),
            ),
            (
                Mood::Defensive,
                compile(&[
                    (r"(?i)\bwhy would i\b|\bare you accusing\b|\bhow dare\b", "rejects suspicion"),
                    (r"(?i)\bi had nothing to do\b|\bi didn't do\b|\bi'm innocent\b", "protests innocence"),
                    (r"(?i)\bnone of your (?:business|concern)\b|\bi resent\b", "pushes back"),
                    (r"\*[^*]*(?:cross(?:es)? (?:his|her) arms|bristl|stiffen)[^*]*\*", "defensive stage direction"),
                ]),
            ),
            (
                Mood::Angry,
                compile(&[
                    (r"(?i)\bangry\b|\bfurious\b|\boutrag(?:ed|eous)\b|\bhow dare you\b", "anger words"),
                    (r"\*[^*]*(?:slam|shout|glare|snap|clench)[^*]*\*", "angry stage direction"),
                ]),
            ),
            (
                Mood::Evasive,
                compile(&[
                    (r"(?i)\bi (?:don't|do not|can't|cannot) (?:recall|remember)\b", "claims not to remember"),
                    (r"(?i)\bi'?d rather not\b|\bwhy does it matter\b|\bthat's not important\b", "deflects"),
                    (r"\*[^*]*(?:looks away|avoids|changes the subject)[^*]*\*", "evasive stage direction"),
                ]),
            ),
            (
                Mood::Sad,
                compile(&[
                    (r"\*[^*]*(?:sigh|tear|sob|cries|weep)[^*]*\*", "sad stage direction"),
                    (r"(?i)\bgrief\b|\bheartbroken\b|\bmiss him\b|\bpoor (?:edmund|father)\b", "grief"),
                ]),
            ),
            (
                Mood::Calm,
                compile(&[
                    (r"\*[^*]*(?:calm|compos|smil|steady|evenly)[^*]*\*", "calm stage direction"),
                    (r"(?i)\bof course\b|\bcertainly\b", "measured tone"),
                ]),
            ),
            (
                Mood::Confident,
                compile(&[
                    (r"(?i)\bi'?m (?:certain|sure|positive)\b|\bwithout a doubt\b|\babsolutely\b", "assertive"),
                ]),
            ),
        ]
    });

// ── Confidence markers ──────────────────────────────────────────────────────

pub static UNCERTAINTY_MARKERS: LazyLock<Vec<LabelRule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bi think\b", "i think"),
        (r"(?i)\bmaybe\b", "maybe"),
        (r"(?i)\bperhaps\b", "perhaps"),
        (r"(?i)\bi'?m not (?:sure|certain)\b", "not sure"),
        (r"(?i)\bprobably\b", "probably"),
        (r"(?i)\bmight have\b|\bmay have\b", "might have"),
        (r"(?i)\bi believe\b", "i believe"),
        (r"(?i)\bpossibly\b", "possibly"),
        (r"(?i)\bi (?:don't|can't) (?:recall|remember)\b", "can't recall"),
        (r"(?i)\bsomewhere around\b|\bor so\b", "approximate"),
    ])
});

pub static CERTAINTY_MARKERS: LazyLock<Vec<LabelRule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bdefinitely\b", "definitely"),
        (r"(?i)\bcertainly\b", "certainly"),
        (r"(?i)\babsolutely\b", "absolutely"),
        (r"(?i)\bi'?m (?:sure|certain|positive)\b", "i'm sure"),
        (r"(?i)\bwithout (?:a )?doubt\b", "without doubt"),
        (r"(?i)\bclearly\b", "clearly"),
        (r"(?i)\bi remember (?:it )?(?:exactly|distinctly|clearly)\b", "distinct memory"),
        (r"(?i)\bexactly\b|\bprecisely\b", "exactly"),
    ])
});

// ── Evasiveness ─────────────────────────────────────────────────────────────

pub static EVASION_RULES: LazyLock<Vec<LabelRule<&'static str>>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)\bi (?:don't|do not|can't|cannot) (?:recall|remember)\b", "memory lapse"),
        (r"(?i)\bi'?d (?:rather|prefer) not\b", "refusal"),
        (r"(?i)\bnone of your (?:business|concern)\b", "refusal"),
        (r"(?i)\bwhy do you ask\b|\bwhat does it matter\b|\bwhy does it matter\b", "deflection"),
        (r"(?i)\bi don't see how\b|\bthat's (?:private|personal)\b", "deflection"),
        (r"(?i)\bno comment\b|\bi couldn't say\b|\bhard to say\b", "non-answer"),
        (r"(?i)\blet'?s not\b|\bmust we\b", "deflection"),
        (r"\*[^*]*(?:changes the subject|looks away|avoids (?:the question|eye contact))[^*]*\*", "avoidance"),
    ])
});

// ── Keyword vocabulary ──────────────────────────────────────────────────────

pub const KEYWORDS: &[&str] = &[
    "murder", "alibi", "blackmail", "inheritance", "disinherit", "poison", "money",
    "debt", "affair", "secret", "argument", "argu", "threat", "jealous", "revenge",
    "knife", "letter", "key", "study", "library", "midnight", "lying", "divorce",
    "gambling", "insurance", "scream", "shout", "blood", "ledger", "the will",
];

/// Substring membership against [`KEYWORDS`]; overlapping stems collapse onto the
/// first listed form.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();
    for kw in KEYWORDS {
        if lowered.contains(kw) && !found.iter().any(|f| f.contains(kw) || kw.contains(f.as_str())) {
            found.push((*kw).to_string());
        }
    }
    found
}

// ── Reducers ────────────────────────────────────────────────────────────────

/// Label of the first rule that matches.
pub fn first_label<L: Copy>(rules: &[LabelRule<L>], text: &str) -> Option<L> {
    rules.iter().find(|r| r.regex.is_match(text)).map(|r| r.label)
}

/// Labels of every rule that matches, deduplicated.
pub fn all_labels<L: Copy + Ord>(rules: &[LabelRule<L>], text: &str) -> BTreeSet<L> {
    rules
        .iter()
        .filter(|r| r.regex.is_match(text))
        .map(|r| r.label)
        .collect()
}

/// Number of rules that match at least once.
pub fn count_matches<L>(rules: &[LabelRule<L>], text: &str) -> usize {
    rules.iter().filter(|r| r.regex.is_match(text)).count()
}

pub fn any_match<L>(rules: &[LabelRule<L>], text: &str) -> bool {
    rules.iter().any(|r| r.regex.is_match(text))
}
