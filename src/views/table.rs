//! Record table.

use serde_json::Value;

use super::{escape, layout};
use crate::data::query::{distinct_values, SortDir, TableQuery};
use crate::storage::DataRecord;

/// Column names: the keys of the first record, in stored order.
pub fn columns(records: &[DataRecord]) -> Vec<&str> {
    records
        .first()
        .map(|first| first.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Cell text for one value. Strings render bare, other values as compact JSON.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Most distinct values a column may have and still get a filter list.
const MAX_FILTER_CHOICES: usize = 50;

fn sort_link(query: &TableQuery, column: &str) -> String {
    let (dir, arrow) = match query.sorted_by(column) {
        Some(current) => (current.flip(), if current == SortDir::Asc { " ▲" } else { " ▼" }),
        None => (SortDir::Asc, ""),
    };
    format!(
        r#"<th><a href="/?{href}">{name}</a>{arrow}</th>"#,
        href = escape(&query.to_query_string(Some((column, dir)))),
        name = escape(column),
        arrow = arrow,
    )
}

fn filter_select(records: &[DataRecord], query: &TableQuery, column: &str) -> Option<String> {
    let values = distinct_values(records, column);
    if values.len() > MAX_FILTER_CHOICES {
        return None;
    }
    let selected = query.selected(column);
    let options: String = values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| {
            let mark = if selected.contains(v) { " selected" } else { "" };
            format!(r#"<option value="{v}"{mark}>{v}</option>"#, v = escape(v), mark = mark)
        })
        .collect();
    Some(format!(
        r#"<label>{name} <select name="f.{name}"><option value="">all</option>{options}</select></label>"#,
        name = escape(column),
        options = options,
    ))
}

fn controls(records: &[DataRecord], query: &TableQuery, columns: &[&str]) -> String {
    let sort_fields = match &query.sort {
        Some((column, dir)) => format!(
            r#"<input type="hidden" name="sort" value="{}"><input type="hidden" name="dir" value="{}">"#,
            escape(column),
            dir.as_str()
        ),
        None => String::new(),
    };
    let filters: String = columns
        .iter()
        .filter_map(|c| filter_select(records, query, c))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<form method="get" action="/">
<input type="search" id="tableSearch" name="q" value="{search}" placeholder="Search">
{filters}
{sort_fields}<button type="submit">Apply</button> <a href="/">Reset</a>
</form>"#,
        search = escape(&query.search),
        filters = filters,
        sort_fields = sort_fields,
    )
}

/// The record table after applying `query`'s search, filters and order.
pub fn table_page(records: &[DataRecord], query: &TableQuery, username: &str) -> String {
    let columns = columns(records);
    let shown = query.apply(records, &columns);

    let header: String = columns.iter().map(|c| sort_link(query, c)).collect();

    let rows: String = if shown.is_empty() {
        format!(
            "<tr><td colspan=\"{}\">No matching records</td></tr>\n",
            columns.len().max(1)
        )
    } else {
        shown
            .iter()
            .map(|record| {
                let cells: String = columns
                    .iter()
                    .map(|c| format!("<td>{}</td>", escape(&cell_text(record.get(*c)))))
                    .collect();
                format!("<tr>{}</tr>\n", cells)
            })
            .collect()
    };

    let total = if query.narrows() {
        format!("{} of {} records", shown.len(), records.len())
    } else {
        format!("{} records", records.len())
    };

    let body = format!(
        r#"<p>Signed in as {user} · <a href="/logout">Log out</a></p>
<h1>Data</h1>
{controls}
<p>{total}</p>
<table>
<thead><tr>{header}</tr></thead>
<tbody>
{rows}</tbody>
</table>"#,
        user = escape(username),
        controls = controls(records, query, &columns),
        total = total,
        header = header,
        rows = rows,
    );
    layout("Data", &body)
}

pub fn no_data_page(username: &str) -> String {
    let body = format!(
        r#"<p>Signed in as {user} · <a href="/logout">Log out</a></p>
<h2>No data available</h2>"#,
        user = escape(username),
    );
    layout("Data", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: Value) -> Vec<DataRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_columns_follow_first_record() {
        let rows = records(json!([
            {"name": "Ana", "age": 25},
            {"age": 30, "name": "João", "city": "Rio"}
        ]));
        assert_eq!(columns(&rows), vec!["name", "age"]);

        let page = table_page(&rows, &TableQuery::default(), "admin");
        assert!(page.contains(r#"<th><a href="/?sort=name&amp;dir=asc">name</a></th>"#));
        assert!(page.contains(r#"<th><a href="/?sort=age&amp;dir=asc">age</a></th>"#));
        assert!(page.contains("<tr><td>Ana</td><td>25</td></tr>"));
        assert!(page.contains("<tr><td>João</td><td>30</td></tr>"));
        assert!(!page.contains("Rio"));
    }

    #[test]
    fn test_cells() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&json!("x"))), "x");
        assert_eq!(cell_text(Some(&json!(null))), "null");
        assert_eq!(cell_text(Some(&json!({"a": [1, 2]}))), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_values_are_escaped() {
        let rows = records(json!([{"<k>": "<script>"}]));
        let page = table_page(&rows, &TableQuery::default(), "admin");
        assert!(page.contains(">&lt;k&gt;</a></th>"));
        assert!(page.contains("<td>&lt;script&gt;</td>"));
    }

    fn query(items: &[(&str, &str)]) -> TableQuery {
        TableQuery::from_pairs(items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_search_and_sort_controls() {
        let rows = records(json!([
            {"name": "Ana", "city": "Recife"},
            {"name": "Bia", "city": "Natal"}
        ]));
        let page = table_page(&rows, &query(&[("q", "rec"), ("sort", "name"), ("dir", "asc")]), "admin");

        assert!(page.contains(r#"id="tableSearch" name="q" value="rec""#));
        assert!(page.contains("1 of 2 records"));
        assert!(page.contains("<tr><td>Ana</td><td>Recife</td></tr>"));
        assert!(!page.contains("<td>Bia</td>"));
        // the active column links to the opposite order and keeps the search
        assert!(page.contains(r#"<a href="/?q=rec&amp;sort=name&amp;dir=desc">name</a> ▲"#));
        assert!(page.contains(r#"<input type="hidden" name="sort" value="name">"#));
    }

    #[test]
    fn test_filter_choices() {
        let rows = records(json!([
            {"name": "Ana", "city": "Recife"},
            {"name": "Bia", "city": "Natal"}
        ]));
        let page = table_page(&rows, &query(&[("f.city", "Natal")]), "admin");
        assert!(page.contains(r#"<select name="f.city"><option value="">all</option>"#));
        assert!(page.contains(r#"<option value="Natal" selected>Natal</option>"#));
        assert!(page.contains(r#"<option value="Recife">Recife</option>"#));
        assert!(page.contains("<tr><td>Bia</td><td>Natal</td></tr>"));
    }

    #[test]
    fn test_no_matches() {
        let rows = records(json!([{"name": "Ana"}]));
        let page = table_page(&rows, &query(&[("q", "zzz")]), "admin");
        assert!(page.contains(r#"<td colspan="1">No matching records</td>"#));
        assert!(page.contains("0 of 1 records"));
    }

    #[test]
    fn test_no_data() {
        assert!(no_data_page("admin").contains("No data available"));
        assert!(columns(&[]).is_empty());
    }
}
