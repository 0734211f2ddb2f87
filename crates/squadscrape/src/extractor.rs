use std::collections::HashSet;
use std::sync::LazyLock;

use crate::config::PipelineConfig;
use crate::parser::{
    ContractWindow, extract_age, extract_contract_expiry, find_dates, has_parenthesized_number,
    normalize_position, normalize_whitespace, parse_market_value,
};
use crate::types::{PlayerRecord, Position};

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

/// Rows with fewer direct cells are section headers or spacer rows.
pub const MIN_ROW_CELLS: usize = 5;

static SEL_TD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: td"));
static SEL_NAME_CELL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("td.hauptlink:not(.rechts)").expect("invalid selector: name cell")
});
static SEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("invalid selector: link"));

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid table selector '{0}'")]
    InvalidSelector(String),
    #[error("Squad table not found: no element matches '{0}'")]
    TableNotFound(String),
}

/// Text pulled from one row of the squad table, before any field parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub name: Option<String>,
    /// Candidate position labels: cell `title` attributes first, then leaf cell texts.
    pub position_labels: Vec<String>,
    /// Whitespace-normalized text of each direct cell, in column order.
    pub cells: Vec<String>,
}

fn elem_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn child_elements<'a>(
    element: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn has_class(element: ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn is_leaf_cell(cell: ElementRef) -> bool {
    !cell
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "td")
}

/// Reads the body rows of the table matching `table_selector`.
///
/// Only direct `tbody > tr` rows of that table count; the inline tables the
/// site nests inside a row are read as part of it.
pub fn extract_rows(html: &str, table_selector: &str) -> Result<Vec<RawRow>, ExtractError> {
    let selector = Selector::parse(table_selector)
        .map_err(|e| ExtractError::InvalidSelector(format!("{table_selector}: {e}")))?;

    let document = Html::parse_document(html);
    let table = document
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractError::TableNotFound(table_selector.to_string()))?;

    let rows = child_elements(table, "tbody")
        .flat_map(|tbody| child_elements(tbody, "tr"))
        .filter_map(|tr| {
            let row = parse_row(tr);
            if row.cells.len() < MIN_ROW_CELLS {
                log::debug!("Skipping row with {} cell(s)", row.cells.len());
                return None;
            }
            Some(row)
        })
        .collect();

    Ok(rows)
}

fn parse_row(tr: ElementRef) -> RawRow {
    let direct_cells: Vec<ElementRef> = child_elements(tr, "td").collect();

    let name = tr
        .select(&SEL_NAME_CELL)
        .next()
        .map(|cell| match cell.select(&SEL_LINK).next() {
            Some(link) => elem_text(link),
            None => elem_text(cell),
        })
        .filter(|name| !name.is_empty());

    let titles = direct_cells
        .iter()
        .filter_map(|cell| cell.value().attr("title"))
        .map(normalize_whitespace);
    let leaf_texts = tr
        .select(&SEL_TD)
        .filter(|cell| is_leaf_cell(*cell) && !has_class(*cell, "hauptlink"))
        .map(elem_text);
    let position_labels = titles
        .chain(leaf_texts)
        .filter(|label| !label.is_empty())
        .collect();

    RawRow {
        name,
        position_labels,
        cells: direct_cells.into_iter().map(elem_text).collect(),
    }
}

/// Finds the cell holding the age and the age it yields.
///
/// The first cell with an in-range parenthesized number wins. Without one, a
/// bare date is only taken as a birth date when a later cell carries another
/// past date (the signing date), so a lone past date is never aged.
fn locate_age(cells: &[String], today: NaiveDate) -> Option<(usize, u8)> {
    let parenthesized = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| has_parenthesized_number(cell))
        .find_map(|(i, cell)| extract_age(cell, today).map(|age| (i, age)));
    if parenthesized.is_some() {
        return parenthesized;
    }

    let past_dates: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| find_dates(cell).next().is_some_and(|date| date < today))
        .map(|(i, _)| i)
        .collect();

    match past_dates.as_slice() {
        [birth, _, ..] => extract_age(&cells[*birth], today).map(|age| (*birth, age)),
        _ => None,
    }
}

/// Applies the field parsers to one row. `None` only when the row has no name.
pub fn build_record(row: &RawRow, window: &ContractWindow, today: NaiveDate) -> Option<PlayerRecord> {
    let name = row.name.clone()?;

    let position = row
        .position_labels
        .iter()
        .map(|label| normalize_position(label))
        .find(Position::is_known)
        .unwrap_or(Position::Unknown);

    let located = locate_age(&row.cells, today);
    let age_cell = located.map(|(i, _)| i);
    let age = located.map(|(_, age)| age);

    let market_value = row
        .cells
        .iter()
        .find(|cell| cell.contains(['€', '$', '£']))
        .map(|cell| parse_market_value(cell))
        .unwrap_or(0.0);

    let contract_expiry = extract_contract_expiry(
        row.cells
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != age_cell)
            .map(|(_, cell)| cell.as_str()),
        window,
        today,
    );

    Some(PlayerRecord {
        name,
        position,
        age,
        market_value,
        contract_expiry,
    })
}

/// Builds records from `rows`, skipping nameless rows and any name already in
/// `seen`. Emitted names are added to `seen`, so the first occurrence wins.
pub fn build_records<'a>(
    rows: impl IntoIterator<Item = &'a RawRow>,
    seen: &mut HashSet<String>,
    window: &ContractWindow,
    today: NaiveDate,
) -> Vec<PlayerRecord> {
    let mut records = Vec::new();

    for row in rows {
        let Some(name) = row.name.as_deref() else {
            log::debug!("Skipping row without a player name");
            continue;
        };
        if seen.contains(name) {
            log::debug!("Skipping repeated row for '{}'", name);
            continue;
        }
        if let Some(record) = build_record(row, window, today) {
            seen.insert(record.name.clone());
            records.push(record);
        }
    }

    records
}

/// Runs a full extraction pass over one squad page.
pub fn extract_players(
    html: &str,
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<Vec<PlayerRecord>, ExtractError> {
    let rows = extract_rows(html, &config.table_selector)?;
    let mut seen = HashSet::new();
    let records = build_records(&rows, &mut seen, &config.contract_window, today);

    log::info!(
        "Extracted {} player(s) from {} table row(s)",
        records.len(),
        rows.len()
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    fn row(name: &str, position: &str, age: &str, value: &str) -> RawRow {
        RawRow {
            name: Some(name.to_string()),
            position_labels: vec![position.to_string()],
            cells: vec![
                "1".to_string(),
                format!("{name} {position}"),
                age.to_string(),
                "01/07/2023".to_string(),
                "30/06/2027".to_string(),
                value.to_string(),
            ],
        }
    }

    #[test]
    fn test_parse_squad_fixture() {
        let html = fs::read_to_string("fixtures/kader_plus.html")
            .expect("Failed to read sample HTML file");

        let players = extract_players(&html, &PipelineConfig::default(), today())
            .expect("Failed to extract players");

        assert_eq!(players.len(), 12);

        let first = &players[0];
        assert_eq!(first.name, "Gauthier Gallon");
        assert_eq!(first.position, Position::Goalkeeper);
        assert_eq!(first.age, Some(32));
        assert_eq!(first.market_value, 1.0);
        assert_eq!(first.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));

        let boura = players
            .iter()
            .find(|p| p.name == "Ismaël Boura")
            .expect("Should find Ismaël Boura");
        assert_eq!(boura.position, Position::Defender);
        assert_eq!(boura.age, Some(25));
        assert_eq!(boura.market_value, 2.5);

        let adeline = players
            .iter()
            .find(|p| p.name == "Martin Adeline")
            .expect("Should find Martin Adeline");
        assert_eq!(adeline.position, Position::Midfielder);
        assert_eq!(adeline.market_value, 3.0);

        let detourbet = players
            .iter()
            .find(|p| p.name == "Mathys Detourbet")
            .expect("Should find Mathys Detourbet");
        assert_eq!(detourbet.position, Position::Forward);
        assert_eq!(detourbet.age, Some(18));
        assert_eq!(detourbet.market_value, 4.0);
    }

    #[test]
    fn test_fixture_soft_fails_per_field() {
        let html = fs::read_to_string("fixtures/kader_plus.html")
            .expect("Failed to read sample HTML file");
        let players = extract_players(&html, &PipelineConfig::default(), today()).unwrap();

        let trialist = players
            .iter()
            .find(|p| p.name == "Lucas Trialist")
            .expect("Should keep row with missing fields");
        assert_eq!(trialist.age, None);
        assert_eq!(trialist.market_value, 0.0);
        assert_eq!(trialist.contract_expiry, None);
        assert_eq!(trialist.position, Position::Unknown);
    }

    #[test]
    fn test_fixture_repeated_section_is_deduplicated() {
        let html = fs::read_to_string("fixtures/kader_plus.html")
            .expect("Failed to read sample HTML file");
        let players = extract_players(&html, &PipelineConfig::default(), today()).unwrap();

        let gallons = players
            .iter()
            .filter(|p| p.name == "Gauthier Gallon")
            .count();
        assert_eq!(gallons, 1);

        let names: HashSet<_> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), players.len());
    }

    #[test]
    fn test_duplicate_name_keeps_first_occurrence() {
        let rows = vec![
            row("Renaud Ripart", "Extremo", "14/03/1993 (32)", "1,20 mill. €"),
            row("Renaud Ripart", "Portero", "14/03/1993 (99)", "300 mil €"),
        ];

        let mut seen = HashSet::new();
        let records = build_records(&rows, &mut seen, &ContractWindow::default(), today());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, Position::Forward);
        assert_eq!(records[0].age, Some(32));
        assert_eq!(records[0].market_value, 1.2);
        assert!(seen.contains("Renaud Ripart"));
    }

    #[test]
    fn test_seen_names_carry_across_calls() {
        let first = vec![row("Abdu Conte", "Lateral izquierdo", "26/03/1998 (27)", "1 mill. €")];
        let second = vec![
            row("Abdu Conte", "Lateral izquierdo", "26/03/1998 (27)", "1 mill. €"),
            row("Jackson Porozo", "Defensa central", "04/08/2000 (25)", "2 mill. €"),
        ];

        let mut seen = HashSet::new();
        let window = ContractWindow::default();
        assert_eq!(build_records(&first, &mut seen, &window, today()).len(), 1);

        let records = build_records(&second, &mut seen, &window, today());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Jackson Porozo");
    }

    #[test]
    fn test_nameless_rows_are_skipped() {
        let mut nameless = row("x", "Portero", "01/01/1990 (35)", "1 mill. €");
        nameless.name = None;

        let mut seen = HashSet::new();
        let records = build_records(&[nameless], &mut seen, &ContractWindow::default(), today());

        assert!(records.is_empty());
        assert!(seen.is_empty());
    }

    #[test]
    fn test_build_record_ignores_signing_date() {
        let record = build_record(
            &row("Yoann Salmier", "Defensa central", "21/11/1992 (32)", "800 mil €"),
            &ContractWindow::default(),
            today(),
        )
        .unwrap();

        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));
        assert_eq!(record.market_value, 0.8);
    }

    #[test]
    fn test_build_record_derives_age_from_birth_date() {
        let record = build_record(
            &row("Wilson Odobert", "Extremo izquierdo", "28/11/2004", "3,50 mill. €"),
            &ContractWindow::default(),
            today(),
        )
        .unwrap();

        assert_eq!(record.age, Some(20));
        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));
    }

    fn cells_row(cells: &[&str]) -> RawRow {
        RawRow {
            name: Some("Player".to_string()),
            position_labels: vec!["Portero".to_string()],
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_record_keeps_contract_when_no_age() {
        let record = build_record(
            &cells_row(&["1", "P Portero", "-", "-", "30/06/2027", "1 mill. €"]),
            &ContractWindow::default(),
            today(),
        )
        .unwrap();

        assert_eq!(record.age, None);
        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));
        assert_eq!(record.market_value, 1.0);
    }

    #[test]
    fn test_build_record_skips_parenthesized_labels() {
        let record = build_record(
            &cells_row(&[
                "1",
                "P (C) Portero",
                "01/01/1997 (28)",
                "01/07/2023",
                "30/06/2027",
                "1 mill. €",
            ]),
            &ContractWindow::default(),
            today(),
        )
        .unwrap();

        assert_eq!(record.age, Some(28));
        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));
    }

    #[test]
    fn test_build_record_does_not_age_a_lone_signing_date() {
        let record = build_record(
            &cells_row(&["1", "P Portero", "-", "01/07/2005", "30/06/2027", "1 mill. €"]),
            &ContractWindow::default(),
            today(),
        )
        .unwrap();

        assert_eq!(record.age, None);
        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2027, 6, 30));
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let html = r#"<html><body><table class="other"><tbody><tr><td>x</td></tr></tbody></table></body></html>"#;

        let result = extract_rows(html, "table.items");
        assert!(matches!(result, Err(ExtractError::TableNotFound(_))));
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let result = extract_rows("<table></table>", "table[");
        assert!(matches!(result, Err(ExtractError::InvalidSelector(_))));
    }

    #[test]
    fn test_flat_row_markup() {
        let html = r#"
            <table class="items">
                <tbody>
                    <tr>
                        <td class="zentriert">7</td>
                        <td class="hauptlink"><a href="/p/1">Xavier Chavalerin</a></td>
                        <td>Mediocentro</td>
                        <td class="zentriert">07/03/1991 (34)</td>
                        <td class="zentriert">30/06/2026</td>
                        <td class="rechts hauptlink"><a>1,80 mill. €</a></td>
                    </tr>
                </tbody>
            </table>
        "#;

        let rows = extract_rows(html, "table.items").expect("Failed to parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name.as_deref(), Some("Xavier Chavalerin"));

        let record = build_record(&rows[0], &ContractWindow::default(), today()).unwrap();
        assert_eq!(record.position, Position::Midfielder);
        assert_eq!(record.age, Some(34));
        assert_eq!(record.market_value, 1.8);
        assert_eq!(record.contract_expiry, NaiveDate::from_ymd_opt(2026, 6, 30));
    }
}
