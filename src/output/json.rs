use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::render_json;
    use crate::deals::Deal;

    #[test]
    fn renders_deals_pretty_in_camel_case() {
        let deals = vec![Deal::new("d1", "Nike", "Endorsement").with_value_range("$50K")];
        let rendered = render_json(&deals).expect("json");
        assert!(rendered.starts_with("[\n"));
        assert!(rendered.contains("\"valueRange\": \"$50K\""));
    }
}
