//! Built-in prompt templates

/// Name of the planning template
pub const BLUEPRINT_TEMPLATE: &str = "blueprint-and-queries";

/// Name of the report template
pub const REPORT_TEMPLATE: &str = "report-from-results";

/// Version tag of the templates compiled into the crate
pub const BUILTIN_VERSION: &str = "builtin-1";

/// System instruction sent with every report request
pub const REPORT_SYSTEM_INSTRUCTION: &str = "You are an HTML report generator. \
You output ONLY a single, complete, valid HTML document and nothing else. \
The document must start with <!DOCTYPE html> and end with </html>. \
Every opened tag must be closed. The HTML must render correctly in a browser. \
Do NOT output markdown, explanations, or commentary, ONLY the HTML. \
Keep the report concise: aim for under 300 lines of HTML.";

pub(crate) const BLUEPRINT_BODY: &str = r#"You are a senior data analyst. You are given the shape of a table and a small sample of its rows. The full table is much larger than the sample and is available to you ONLY through SQL.

## Your task
1. Write a short analysis blueprint: what the data appears to describe, which questions a reader would care about, and which sections the final report should have.
2. Write the SQL queries that answer those questions over the FULL table.

## SQL rules
- The table is named `data`. Column names are exactly as listed below; quote them with double quotes if they contain spaces or punctuation.
- Only read data: use SELECT (optionally WITH). Never modify the table.
- Prefer aggregates (COUNT, SUM, AVG, MIN, MAX, GROUP BY) over listing raw rows. Add LIMIT to any query that could return many rows.
- Put ALL queries in a single ```sql fenced block, each terminated by a semicolon.
- Do not reference columns that are not listed.

## Table"#;

pub(crate) const REPORT_BODY: &str = r#"You are writing the final analytical report for a dataset. Below you receive the analysis blueprint and the results of the SQL queries it proposed. The results were computed over the complete dataset, so use their numbers as facts.

## Requirements
- Produce one self-contained HTML document with inline CSS and no external resources.
- Follow the structure suggested by the blueprint: a title, an executive summary, then one section per theme.
- Present figures from the query results in tables; quote numbers exactly as given.
- If a query failed (marked ERROR), do not invent its result. Skip it or mention briefly that the figure is unavailable.
- Close with a short list of key findings."#;
