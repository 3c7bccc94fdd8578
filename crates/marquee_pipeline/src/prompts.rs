//! Prompt builders for each pipeline phase.
//!
//! Every prompt explicitly requests JSON-only output; the extraction module
//! still tolerates prose-wrapped responses. Later phases embed the text the
//! type phase already read off the poster to avoid re-OCR.

/// Prompt for the type classification phase.
pub(crate) fn type_prompt() -> String {
    "You are analyzing a poster image. Classify it as exactly one of: \
     concert, festival, comedy, theater, film, album, promo, exhibition, hybrid. \
     Use 'hybrid' when the poster advertises both a release and a live event \
     (e.g. an album launch show). Also transcribe all text you can read.\n\n\
     Output ONLY valid JSON with this shape:\n\
     {\"poster_type\": \"concert\", \"confidence\": 0.0, \
     \"evidence\": \"why\", \
     \"alternates\": [{\"type\": \"album\", \"confidence\": 0.0}], \
     \"extracted_text\": \"all text on the poster\"}"
        .to_string()
}

/// Prompt for the artist extraction phase.
pub(crate) fn artist_prompt(extracted_text: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract the performers from this poster. The headliner is the most \
         prominently billed act. Do NOT put dates, venue names, or prices in \
         artist fields.\n\n",
    );
    if let Some(text) = extracted_text {
        prompt.push_str("Text already read from the poster:\n");
        prompt.push_str(text);
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "Output ONLY valid JSON with this shape:\n\
         {\"headliner\": \"name\", \"supporting_acts\": [\"name\"], \"confidence\": 0.0}",
    );
    prompt
}

/// Prompt for the venue extraction phase.
pub(crate) fn venue_prompt(extracted_text: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract the venue and location from this poster. Answer with the \
         venue NAME only, never a sentence describing it.\n\n",
    );
    if let Some(text) = extracted_text {
        prompt.push_str("Text already read from the poster:\n");
        prompt.push_str(text);
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "Output ONLY valid JSON with this shape:\n\
         {\"venue\": \"name\", \"city\": \"\", \"state\": \"\", \"country\": \"\", \
         \"confidence\": 0.0}",
    );
    prompt
}

/// Prompt for the event extraction phase.
pub(crate) fn event_prompt(extracted_text: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract the event details from this poster: every show date exactly \
         as printed, the event title if distinct from the headliner, and the \
         ticket price if shown.\n\n",
    );
    if let Some(text) = extracted_text {
        prompt.push_str("Text already read from the poster:\n");
        prompt.push_str(text);
        prompt.push_str("\n\n");
    }
    prompt.push_str(
        "Output ONLY valid JSON with this shape:\n\
         {\"title\": \"\", \"dates\": [\"Fri 14 June 2024\"], \
         \"ticket_price\": \"\", \"confidence\": 0.0}",
    );
    prompt
}

/// General extraction prompt used for the consensus fan-out: every provider
/// answers the same question so outputs align field-by-field.
pub(crate) fn consensus_prompt() -> String {
    "Extract structured information from this poster image.\n\n\
     Output ONLY valid JSON with this shape:\n\
     {\"poster_type\": \"concert|festival|comedy|theater|film|album|promo|exhibition|hybrid\", \
     \"title\": \"\", \"headliner\": \"\", \"supporting_acts\": [\"\"], \
     \"venue\": \"\", \"city\": \"\", \"state\": \"\", \"country\": \"\", \
     \"dates\": [\"\"], \"ticket_price\": \"\", \"label\": \"\", \
     \"director\": \"\", \"cast\": [\"\"]}\n\
     Leave a field empty if it is not on the poster. Never guess."
        .to_string()
}

/// Prompt for the self-review phase, carrying the catalog of known error
/// patterns and the draft to critique.
pub(crate) fn review_prompt(draft_json: &str) -> String {
    format!(
        "You previously extracted the following data from this poster image. \
         Review it against the image and correct any mistakes.\n\n\
         Known error patterns to check for:\n\
         - Date or venue text misfiled as the artist name \
         (e.g. headliner = \"Sunday 27 January Prince of Wales\")\n\
         - An explanatory sentence misfiled as the venue name\n\
         - Film actors mislabeled as musicians\n\
         - Ticket price text misread as part of a title\n\n\
         Draft:\n{draft_json}\n\n\
         Output ONLY valid JSON with this shape:\n\
         {{\"passed\": true, \"confidence\": 0.0, \
         \"corrections\": [{{\"field\": \"headliner\", \"current_value\": \"\", \
         \"corrected_value\": null, \"confidence\": 0.0, \"reason\": \"\"}}], \
         \"flagged_fields\": [\"\"]}}\n\
         Use corrected_value null when the field should be cleared entirely."
    )
}
