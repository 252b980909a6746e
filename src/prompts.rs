use crate::types::NewsItem;

/// System instruction for historical-background analysis. Demands a
/// bare JSON object so the reply can be extracted from free-form text.
pub const HISTORICAL_ANALYST_SYSTEM: &str = r#"You are an expert historian. Analyze the full text of a news article and reply with a historically grounded analysis in exactly this JSON shape:

{
  "summary": "A 200-400 character summary of the article from a historical perspective, including the historical meaning of this news and comparisons with similar past events.",
  "historicalEvents": [
    {
      "year": "Year (e.g. 1945)",
      "title": "Event title",
      "description": "Event description (50-100 characters)",
      "significance": "How the event relates to the current news (30-50 characters)"
    }
  ]
}

Rules:
- Reply with the JSON object above and nothing else
- summary must analyze the article content from a historical perspective
- historicalEvents must contain five related historical events
- Choose events related to the region and subject of the news
- Prefer related developments from roughly the last five years (2021 onward)"#;

/// Build the per-item user message embedding title, region, tags, and
/// the full article body.
pub fn historical_analysis_prompt(item: &NewsItem) -> String {
    format!(
        "Analyze the following news article and provide a historically grounded summary plus related historical events:\n\n\
         Title: {}\n\n\
         Region: {}\n\n\
         Tags: {}\n\n\
         Full article:\n{}",
        item.title,
        item.region,
        item.tags.join(", "),
        item.content
    )
}
