// Test fixtures - sample notes as word sequences with annotation positions
// WHY: Token offsets are derived from the words so fixtures stay readable

#![allow(dead_code)]

/// Single sentence with one chemotherapy mention and one dated time expression
pub const SIMPLE_NOTE: &[&str] = &["Patient", "started", "chemo", "in", "May", "2020", "."];
pub const SIMPLE_PROCEDURES: &[(usize, usize)] = &[(2, 2)];
pub const SIMPLE_TIMEXES: &[(usize, usize, Option<&str>)] = &[(4, 5, Some("2020-05"))];
pub const SIMPLE_TLINK_INSTANCE: &str = "Patient started <e> chemo </e> in <t> May 2020 </t> .";

/// Two chemotherapy mentions, one hypothetical, and two time expressions
pub const TWO_MENTION_NOTE: &[&str] = &[
    "Chemo", "given", "on", "March", "3", ";", "may", "consider", "chemo", "again", "next", "week", ".",
];
pub const TWO_MENTION_PROCEDURES: &[(usize, usize)] = &[(0, 0), (8, 8)];
pub const TWO_MENTION_TIMEXES: &[(usize, usize, Option<&str>)] =
    &[(3, 4, Some("2020-03-03")), (10, 11, None)];

/// Expected TSV header with the DTR columns
pub const DTR_HEADER: &str = "DCT\tpatient_id\tchemo_text\tchemo_annotation_id\tdtr\tnormed_timex\ttimex_annotation_id\ttlink\tnote_name\tdtr_inst\ttlink_inst";

/// Expected TSV header without the DTR columns
pub const PLAIN_HEADER: &str = "DCT\tpatient_id\tchemo_text\tchemo_annotation_id\tnormed_timex\ttimex_annotation_id\ttlink\tnote_name\ttlink_inst";
