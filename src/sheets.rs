use serde_json::{json, Value};

use crate::error::ApiError;

pub const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Tab holding the points ledger. Row 1 is the header.
pub const LEDGER_TAB: &str = "Sheet1";

/// 0-based column index to A1 letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index;
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1 range covering `width` columns of rows `first_row..=last_row` (1-based).
pub fn block_range(tab: &str, width: usize, first_row: usize, last_row: usize) -> String {
    let last_col = column_letter(width.saturating_sub(1));
    format!("{}!A{}:{}{}", tab, first_row, last_col, last_row)
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Rows as returned by the values endpoint. Trailing unwritten cells are
/// simply absent, so rows may be shorter than the header.
pub fn parse_values(body: &Value) -> Vec<Vec<String>> {
    body.get("values")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|cells| cells.iter().map(cell_to_string).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

pub struct SheetsClient<'a> {
    http: &'a reqwest::Client,
    token: String,
}

impl<'a> SheetsClient<'a> {
    pub fn new(http: &'a reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str, suffix: &str) -> String {
        format!(
            "{}/{}/values/{}{}",
            SHEETS_BASE,
            spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }

    async fn check(resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::RemoteApi(format!(
                "sheets request failed with {}: {}",
                status, body
            )));
        }
        Ok(resp.json().await?)
    }

    pub async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ApiError> {
        let url = self.values_url(spreadsheet_id, range, "");
        let resp = self.http.get(&url).bearer_auth(&self.token).send().await?;
        let body = Self::check(resp).await?;
        Ok(parse_values(&body))
    }

    pub async fn values_update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), ApiError> {
        let url = self.values_url(spreadsheet_id, range, "?valueInputOption=RAW");
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn values_append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), ApiError> {
        let url = self.values_url(
            spreadsheet_id,
            range,
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_letters_cover_the_wrap() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(4), "E");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
    }

    #[test]
    fn block_ranges_are_one_based() {
        assert_eq!(block_range("Sheet1", 5, 1, 1), "Sheet1!A1:E1");
        assert_eq!(block_range("Sheet1", 6, 2, 11), "Sheet1!A2:F11");
    }

    #[test]
    fn parse_values_keeps_short_rows_short() {
        let body = json!({
            "range": "Sheet1!A1:C3",
            "values": [["a", "b", "c"], ["d"], []]
        });
        let rows = parse_values(&body);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["a", "b", "c"]);
        assert_eq!(rows[1], vec!["d"]);
        assert!(rows[2].is_empty());
    }

    #[test]
    fn parse_values_stringifies_numeric_cells() {
        let body = json!({ "values": [["s1", "A B", "a@x.com", 650, "Junior"]] });
        let rows = parse_values(&body);
        assert_eq!(rows[0][3], "650");
    }
}
