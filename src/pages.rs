//! HTML adapter over the view state. Pure string building, no I/O.

use serde_json::Value;

use crate::api::{CategoryRecord, Figure, PropertyDetail, PropertyOption};
use crate::histogram::BinSet;
use crate::listing::{value_text, ListingFilter, SortSpec};
use crate::report::{parse_report, ReportBlock};
use crate::table::{category_rows, property_href, TableCell, DASHBOARD_COLUMNS, NOT_AVAILABLE};
use crate::view::{
    DashboardView, LoadState, MapSection, OpportunityView, PropertySection, PropertyView,
    SectionPayload, ViewError,
};

pub const NO_DATA: &str = "No data available";
pub const NO_COORDINATES: &str = "No coordinates available for this property";
pub const EMPTY_SEARCH: &str = "No properties match your search.";

/// Category groups in page order. Groups the backend sends beyond these are
/// appended afterwards in backend order.
pub const CATEGORY_ORDER: [&str; 8] = [
    "Property Information",
    "Location Details",
    "Demographics Data (5 min)",
    "Demographics Data (10 min)",
    "Demographics Data (15 min)",
    "Demographics Data (20 min)",
    "Demographics Data (25 min)",
    "Analytics Metrics",
];

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = ":root{--bg:#f4f1ea;--card:#fff;--ink:#1d2a22;--muted:#5e6b63;--line:#d9ddd6;--head:#2f4a3a;--accent:#3f7d58;--warn:#fff4d6;--err:#fde8e6}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Segoe UI\",\"Helvetica Neue\",sans-serif;background:var(--bg)}nav{background:var(--head);padding:10px 18px}nav a{color:#eef5f0;text-decoration:none;margin-right:18px;font-weight:600}.shell{max-width:1400px;margin:0 auto;padding:20px 16px}.hero{background:linear-gradient(135deg,#24402f,#3f7d58);color:#f5faf6;border-radius:14px;padding:16px 20px}.hero h1{margin:0 0 6px;font-size:1.5rem}.card{margin-top:16px;background:var(--card);border:1px solid var(--line);border-radius:14px;padding:14px 16px}.toolbar{display:flex;flex-wrap:wrap;gap:10px;align-items:center}.filter-btn{padding:6px 12px;border-radius:8px;border:1px solid var(--accent);color:var(--accent);text-decoration:none}.filter-btn.active{background:var(--accent);color:#fff}.counts{color:var(--muted);font-size:.9rem}table{width:100%;border-collapse:collapse}th{background:var(--head);color:#f1f6f2;text-align:left;padding:8px;font-size:.8rem;text-transform:uppercase}td{padding:7px 8px;border-bottom:1px solid var(--line);font-size:.88rem}td.num{text-align:right}.empty,.placeholder{padding:18px;text-align:center;color:var(--muted)}.error{background:var(--err);border:1px solid #e7b3ad;border-radius:10px;padding:12px}.warning{background:var(--warn);border:1px solid #ecd48f;border-radius:10px;padding:12px}.bars{display:flex;align-items:flex-end;gap:6px;height:160px;padding-top:10px}.bar{flex:1;display:flex;flex-direction:column;justify-content:flex-end;align-items:center;font-size:.7rem;color:var(--muted)}.bar span.fill{width:100%;background:var(--accent);border-radius:4px 4px 0 0}.charts{display:grid;grid-template-columns:repeat(auto-fit,minmax(320px,1fr));gap:16px}.figure{min-height:320px}.fw-bold{font-weight:700}.text-primary{color:#1f5fa8}.text-success{color:#2e7d32}.text-dark{color:#1d2a22}details.section>summary{cursor:pointer;font-weight:700;font-size:1.05rem}";

const SECTION_SCRIPT: &str = "document.querySelectorAll('details.section').forEach(function(d){var load=function(){var body=d.querySelector('.section-body');fetch(d.dataset.url).then(function(r){return r.text()}).then(function(html){body.innerHTML=html;body.dataset.loaded=body.querySelector('.error')?'':'1';renderFigures(body)}).catch(function(e){body.innerHTML='<div class=\"error\">'+e+'</div>'})};d.addEventListener('toggle',function(){var body=d.querySelector('.section-body');if(d.open&&!body.dataset.loaded){load()}});d.addEventListener('click',function(ev){if(ev.target.matches('[data-retry]')){ev.preventDefault();load()}})});";

const FIGURE_SCRIPT: &str = "function renderFigures(root){(root||document).querySelectorAll('script[data-figure-for]').forEach(function(s){if(!window.Plotly){return}var fig=JSON.parse(s.textContent);Plotly.newPlot(s.dataset.figureFor,fig.data,fig.layout,{responsive:true})})}document.addEventListener('DOMContentLoaded',function(){renderFigures(document)});";

const RADAR_SCRIPT: &str = "var sel=document.getElementById('property-select');var radar=document.getElementById('radar-slot');function loadRadar(){if(!sel.value){return}radar.innerHTML='<div class=\"placeholder\">Loading radar chart...</div>';fetch('/opportunity/radar/'+encodeURIComponent(sel.value)+'?page='+radar.dataset.page).then(function(r){return r.text()}).then(function(html){radar.innerHTML=html;renderFigures(radar)})}if(sel){sel.addEventListener('change',loadRadar);radar.addEventListener('click',function(ev){if(ev.target.matches('[data-retry]')){ev.preventDefault();loadRadar()}})}";

/// Links and forms carry `page` so follow-up requests reach the same held view.
pub fn render_dashboard_page(page: u64, view: &DashboardView) -> String {
    let page = page.to_string();
    let filter = view.filter();
    let sort = view.sort();
    let term = view.search_term();

    let mut out = String::new();
    out.push_str(&format!(
        "<section class=\"hero\" data-page=\"{page}\"><h1>ADLA Property Dashboard</h1>"
    ));
    out.push_str(&format!(
        "<div>Active filter: <strong id=\"active-filter\">{}</strong></div></section>\n",
        escape_html(filter.label())
    ));

    out.push_str("<section class=\"card\"><div class=\"toolbar\">");
    for option in ListingFilter::ALL {
        let class = if option == filter {
            "filter-btn active"
        } else {
            "filter-btn"
        };
        let href = query_href(
            "/dashboard",
            &[
                ("page", &page),
                ("filter", option.as_str()),
                ("sort", sort.as_str()),
                ("q", term),
            ],
        );
        out.push_str(&format!(
            "<a class=\"{class}\" data-filter=\"{}\" href=\"{}\">{}</a>",
            option.as_str(),
            escape_html(&href),
            escape_html(option.label())
        ));
    }

    out.push_str("<form method=\"get\" action=\"/dashboard\" class=\"toolbar\">");
    out.push_str(&format!(
        "<input type=\"hidden\" name=\"page\" value=\"{page}\"><input type=\"hidden\" name=\"filter\" value=\"{}\">",
        filter.as_str()
    ));
    out.push_str("<select name=\"sort\" id=\"sort-select\">");
    for option in SortSpec::ALL {
        let selected = if option == sort { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>",
            option.as_str(),
            escape_html(option.label())
        ));
    }
    out.push_str("</select>");
    out.push_str(&format!(
        "<input type=\"search\" name=\"q\" id=\"search-input\" placeholder=\"Search properties\" value=\"{}\">",
        escape_html(term)
    ));
    out.push_str("<button type=\"submit\">Apply</button></form>");
    out.push_str(&format!(
        "<a class=\"filter-btn\" id=\"export-csv\" href=\"{}\">Export CSV</a>",
        escape_html(&query_href(
            "/dashboard/export.csv",
            &[("page", &page), ("filter", filter.as_str()), ("sort", sort.as_str())],
        ))
    ));
    out.push_str("</div></section>\n");

    match view.state() {
        LoadState::Idle | LoadState::Loading => {
            out.push_str("<section class=\"card\"><div class=\"placeholder\">Loading properties...</div></section>\n");
        }
        LoadState::Failed(err) => {
            let retry = query_href(
                "/dashboard",
                &[
                    ("page", &page),
                    ("filter", filter.as_str()),
                    ("sort", sort.as_str()),
                    ("q", term),
                ],
            );
            out.push_str("<section class=\"card\">");
            push_error_panel(&mut out, err, Some(&retry));
            out.push_str("</section>\n");
        }
        LoadState::Loaded(_) => {
            let render = view.render();
            out.push_str("<section class=\"card\">");
            out.push_str(&format!(
                "<div class=\"counts\">Showing <span id=\"visible-count\">{}</span> of <span id=\"total-count\">{}</span> properties</div>",
                render.visible_count, render.total_count
            ));
            if render.empty_state {
                out.push_str(&format!(
                    "<div class=\"empty\" id=\"empty-state\">{}</div>",
                    escape_html(EMPTY_SEARCH)
                ));
            } else {
                out.push_str("<table id=\"listings-table\"><thead><tr>");
                for column in DASHBOARD_COLUMNS {
                    out.push_str(&format!("<th>{}</th>", escape_html(column.header)));
                }
                out.push_str("</tr></thead><tbody>\n");
                for row in &render.rows {
                    out.push_str("<tr>");
                    for cell in &row.cells {
                        push_table_cell(&mut out, cell);
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</tbody></table>");
            }
            out.push_str("</section>\n");

            out.push_str("<section class=\"charts\">");
            push_histogram(&mut out, "score-distribution", "Score Distribution", &render.score_bins);
            push_histogram(
                &mut out,
                "price-distribution",
                "Price per Acre Distribution",
                &render.price_bins,
            );
            out.push_str("</section>\n");
        }
    }

    page_shell("ADLA Property Dashboard", &out, &[])
}

/// `page` is `None` when the view is not held for follow-up requests; section
/// and export links then fall back to one-off fetches.
pub fn render_property_page(page: Option<u64>, view: &PropertyView) -> String {
    let stock = view.stock_number();
    let page = page.map(|page| page.to_string()).unwrap_or_default();
    let mut out = String::new();

    match view.detail() {
        LoadState::Idle | LoadState::Loading => {
            out.push_str("<section class=\"card\"><div class=\"placeholder\">Loading property...</div></section>\n");
        }
        LoadState::Failed(err) => {
            out.push_str(&format!(
                "<section class=\"hero\"><h1>Property {}</h1></section><section class=\"card\">",
                escape_html(stock)
            ));
            if err.is_not_found() {
                out.push_str(&format!(
                    "<div class=\"error\" data-section=\"Property\"><strong>Property not found.</strong> {}</div>",
                    escape_html(&err.to_string())
                ));
            } else {
                push_error_panel(&mut out, err, Some(&property_href(stock)));
            }
            out.push_str("</section>\n");
        }
        LoadState::Loaded(detail) => {
            push_property_summary(&mut out, detail, &page);
            for category in ordered_categories(detail) {
                push_category_table(&mut out, category.0, category.1);
            }
            for section in PropertySection::ALL {
                let url = query_href(
                    &format!("{}/sections/{}", property_href(stock), section.as_str()),
                    &[("page", &page)],
                );
                out.push_str(&format!(
                    "<section class=\"card\"><details class=\"section\" id=\"section-{name}\" data-url=\"{url}\"><summary>{title}</summary><div class=\"section-body\"><div class=\"placeholder\">Loading {title}...</div></div></details></section>\n",
                    name = section.as_str(),
                    url = escape_html(&url),
                    title = escape_html(section.title()),
                ));
            }
        }
    }

    page_shell(
        &format!("Property {stock}"),
        &out,
        &[FIGURE_SCRIPT, SECTION_SCRIPT],
    )
}

/// Fragment for one lazily loaded property section.
pub fn render_section_fragment(section: PropertySection, state: &LoadState<SectionPayload>) -> String {
    let mut out = String::new();
    match state {
        LoadState::Idle | LoadState::Loading => {
            out.push_str(&format!(
                "<div class=\"placeholder\">Loading {}...</div>",
                escape_html(section.title())
            ));
        }
        LoadState::Failed(err) => push_error_panel(&mut out, err, None),
        LoadState::Loaded(SectionPayload::Map(map)) => push_map(&mut out, map),
        LoadState::Loaded(SectionPayload::Opportunity(charts)) => {
            let named = charts.named();
            if named.iter().all(|(_, _, raw)| raw.is_none()) {
                out.push_str(&format!("<div class=\"placeholder\">{NO_DATA}</div>"));
            } else {
                out.push_str("<div class=\"charts\">");
                for (key, title, raw) in named {
                    if let Some(raw) = raw {
                        push_figure(&mut out, &format!("opportunity-{key}"), title, raw);
                    }
                }
                out.push_str("</div>");
            }
        }
        LoadState::Loaded(SectionPayload::AiReport(report)) => push_report(&mut out, &report.report),
    }
    out
}

pub fn render_opportunity_page(page: u64, view: &OpportunityView) -> String {
    let mut out = String::new();
    out.push_str("<section class=\"hero\"><h1>Opportunity Dashboard</h1><div>Portfolio-wide opportunity analysis</div></section>\n");

    out.push_str("<section class=\"card\">");
    match view.visualizations() {
        LoadState::Idle | LoadState::Loading => {
            out.push_str("<div class=\"placeholder\">Loading visualizations...</div>");
        }
        LoadState::Failed(err) => push_error_panel(&mut out, err, Some("/opportunity")),
        LoadState::Loaded(visualizations) => {
            out.push_str("<div class=\"charts\">");
            for (id, title, raw) in visualizations.named() {
                match raw {
                    Some(raw) => push_figure(&mut out, id, title, raw),
                    None => out.push_str(&format!(
                        "<div class=\"card\" id=\"{id}\"><h3>{}</h3><div class=\"placeholder\">{NO_DATA}</div></div>",
                        escape_html(title)
                    )),
                }
            }
            out.push_str("</div>");
        }
    }
    out.push_str("</section>\n");

    out.push_str("<section class=\"card\"><h3>Property Radar</h3>");
    match view.properties() {
        LoadState::Idle | LoadState::Loading => {
            out.push_str("<div class=\"placeholder\">Loading properties...</div>");
        }
        LoadState::Failed(err) => push_error_panel(&mut out, err, Some("/opportunity")),
        LoadState::Loaded(options) => push_property_selector(&mut out, options),
    }
    out.push_str(&format!(
        "<div id=\"radar-slot\" data-page=\"{page}\"></div></section>\n"
    ));

    page_shell("Opportunity Dashboard", &out, &[FIGURE_SCRIPT, RADAR_SCRIPT])
}

pub fn render_radar_fragment(property_id: &str, state: &LoadState<Value>) -> String {
    let mut out = String::new();
    match state {
        LoadState::Idle | LoadState::Loading => {
            out.push_str("<div class=\"placeholder\">Loading radar chart...</div>");
        }
        LoadState::Failed(err) => push_error_panel(&mut out, err, None),
        LoadState::Loaded(raw) => push_figure(
            &mut out,
            "property-radar",
            &format!("Radar for {property_id}"),
            raw,
        ),
    }
    out
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `path?k=v&...` with empty values dropped and form encoding applied.
pub fn query_href(path: &str, pairs: &[(&str, &str)]) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://adla.local/") else {
        return path.to_string();
    };
    url.query_pairs_mut()
        .extend_pairs(pairs.iter().filter(|(_, value)| !value.is_empty()));
    match url.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_string(),
    }
}

fn page_shell(title: &str, body: &str, scripts: &[&str]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str(&format!("<style>{STYLE}</style>\n"));
    if !scripts.is_empty() {
        out.push_str(&format!("<script src=\"{PLOTLY_CDN}\"></script>\n"));
    }
    out.push_str("</head><body>\n");
    out.push_str("<nav><a href=\"/dashboard\">Dashboard</a><a href=\"/opportunity\">Opportunity</a></nav>\n");
    out.push_str("<main class=\"shell\">\n");
    out.push_str(body);
    out.push_str("</main>\n");
    for script in scripts {
        out.push_str("<script>");
        out.push_str(script);
        out.push_str("</script>\n");
    }
    out.push_str("</body></html>\n");
    out
}

fn push_error_panel(out: &mut String, err: &ViewError, retry_href: Option<&str>) {
    let kind = match err {
        ViewError::Network { .. } => "network",
        ViewError::DataFormat { .. } => "data-format",
    };
    out.push_str(&format!(
        "<div class=\"error\" data-error=\"{kind}\" data-section=\"{}\"><strong>{}</strong> {}",
        escape_html(err.section()),
        escape_html(&format!("Could not load {}.", err.section())),
        escape_html(&err.to_string())
    ));
    match retry_href {
        Some(href) => out.push_str(&format!(
            " <a class=\"filter-btn\" href=\"{}\">Retry</a>",
            escape_html(href)
        )),
        None => out.push_str(" <button type=\"button\" data-retry=\"1\">Retry</button>"),
    }
    out.push_str("</div>");
}

fn push_table_cell(out: &mut String, cell: &TableCell) {
    let mut classes = Vec::new();
    if cell.numeric {
        classes.push("num");
    }
    if let Some(style) = cell.style {
        classes.push(style.css_class());
    }
    out.push_str(&format!("<td class=\"{}\">", classes.join(" ")));
    match &cell.href {
        Some(href) => out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            escape_html(href),
            escape_html(&cell.text)
        )),
        None => out.push_str(&escape_html(&cell.text)),
    }
    out.push_str("</td>");
}

fn push_histogram(out: &mut String, id: &str, title: &str, bins: &BinSet) {
    out.push_str(&format!(
        "<div class=\"card\" id=\"{id}\"><h3>{}</h3>",
        escape_html(title)
    ));
    if bins.is_empty() || bins.total() == 0 {
        out.push_str(&format!("<div class=\"placeholder\">{NO_DATA}</div></div>"));
        return;
    }

    let max = bins.max_count().max(1);
    out.push_str("<div class=\"bars\">");
    for bin in &bins.bins {
        let height = bin.count * 100 / max;
        out.push_str(&format!(
            "<div class=\"bar\" title=\"{label}: {count}\"><span>{count}</span><span class=\"fill\" style=\"height:{height}%\"></span><span>{label}</span></div>",
            label = escape_html(&bin.label),
            count = bin.count,
        ));
    }
    out.push_str("</div></div>");
}

fn push_property_summary(out: &mut String, detail: &PropertyDetail, page: &str) {
    let summary = &detail.summary;
    let text = |value: &Value| {
        value_text(value)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    out.push_str(&format!(
        "<section class=\"hero\" data-page=\"{}\"><h1>Property {}</h1><div>{}</div>",
        escape_html(page),
        escape_html(&summary.stock_number),
        escape_html(&summary.location)
    ));
    out.push_str(&format!(
        "<div>Price: <strong>{}</strong> | Acres: <strong>{}</strong> | Score: <strong>{}</strong></div>",
        escape_html(&text(&summary.price)),
        escape_html(&text(&summary.acres)),
        escape_html(&text(&summary.score))
    ));
    if let Some(company) = &summary.company {
        out.push_str(&format!("<div>Listed by {}</div>", escape_html(company)));
    }
    if let Some(phone) = &summary.phone {
        out.push_str(&format!("<div>Phone: {}</div>", escape_html(phone)));
    }
    let export = query_href(
        &format!("{}/export.json", property_href(&summary.stock_number)),
        &[("page", page)],
    );
    out.push_str(&format!(
        "<div><a class=\"filter-btn active\" id=\"export-json\" href=\"{}\">Export JSON</a> <a class=\"filter-btn active\" href=\"/dashboard\">Back to dashboard</a></div></section>\n",
        escape_html(&export)
    ));
}

fn ordered_categories(detail: &PropertyDetail) -> Vec<(&str, Option<&CategoryRecord>)> {
    let mut ordered: Vec<(&str, Option<&CategoryRecord>)> = CATEGORY_ORDER
        .iter()
        .map(|name| (*name, detail.category(name)))
        .collect();
    ordered.extend(
        detail
            .categories
            .iter()
            .filter(|category| !CATEGORY_ORDER.contains(&category.name.as_str()))
            .map(|category| (category.name.as_str(), Some(category))),
    );
    ordered
}

fn push_category_table(out: &mut String, name: &str, category: Option<&CategoryRecord>) {
    out.push_str(&format!(
        "<section class=\"card category\"><h3>{}</h3>",
        escape_html(name)
    ));
    let rows = category.map(category_rows).unwrap_or_default();
    if rows.is_empty() {
        out.push_str(&format!("<div class=\"placeholder\">{NO_DATA}</div></section>\n"));
        return;
    }

    out.push_str("<table><tbody>");
    for row in rows {
        let class = row.style.map(|style| style.css_class()).unwrap_or("");
        out.push_str(&format!(
            "<tr><th>{}</th><td class=\"{class}\">{}</td></tr>",
            escape_html(&row.name),
            escape_html(&row.value)
        ));
    }
    out.push_str("</tbody></table></section>\n");
}

fn push_map(out: &mut String, map: &MapSection) {
    match (map.coordinates, map.embed_url()) {
        (Some(coords), Some(embed)) => {
            out.push_str(&format!(
                "<iframe id=\"property-map\" title=\"{}\" width=\"100%\" height=\"380\" frameborder=\"0\" src=\"{}\"></iframe>",
                escape_html(&map.location),
                escape_html(&embed)
            ));
            out.push_str(&format!(
                "<div class=\"counts\">{:.6}, {:.6}</div>",
                coords.latitude, coords.longitude
            ));
        }
        _ => out.push_str(&format!("<div class=\"warning\">{NO_COORDINATES}</div>")),
    }
}

/// Embeds one chart. An invalid payload renders an inline error naming the
/// chart instead of the figure.
fn push_figure(out: &mut String, id: &str, title: &str, raw: &Value) {
    out.push_str(&format!(
        "<div class=\"card\"><h3>{}</h3>",
        escape_html(title)
    ));
    match Figure::from_value(raw).and_then(|figure| {
        serde_json::to_string(&figure).map_err(|err| err.to_string())
    }) {
        Ok(json) => {
            out.push_str(&format!("<div class=\"figure\" id=\"{id}\"></div>"));
            out.push_str(&format!(
                "<script type=\"application/json\" data-figure-for=\"{id}\">{}</script>",
                json.replace("</", "<\\/")
            ));
        }
        Err(message) => {
            let err = ViewError::data_format(title, message);
            push_error_panel(out, &err, None);
        }
    }
    out.push_str("</div>");
}

fn push_report(out: &mut String, text: &str) {
    let blocks = parse_report(text);
    if blocks.is_empty() {
        out.push_str(&format!("<div class=\"placeholder\">{NO_DATA}</div>"));
        return;
    }

    out.push_str("<div class=\"ai-report\">");
    let mut open_list: Option<&str> = None;
    for block in &blocks {
        let wanted = match block {
            ReportBlock::Bullet(_) => Some("ul"),
            ReportBlock::Numbered(_) => Some("ol"),
            ReportBlock::Heading(_) | ReportBlock::Paragraph(_) => None,
        };
        if open_list != wanted {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = wanted {
                out.push_str(&format!("<{tag}>"));
            }
            open_list = wanted;
        }
        match block {
            ReportBlock::Heading(text) => out.push_str(&format!("<h4>{}</h4>", escape_html(text))),
            ReportBlock::Bullet(text) | ReportBlock::Numbered(text) => {
                out.push_str(&format!("<li>{}</li>", escape_html(text)))
            }
            ReportBlock::Paragraph(text) => out.push_str(&format!("<p>{}</p>", escape_html(text))),
        }
    }
    if let Some(tag) = open_list {
        out.push_str(&format!("</{tag}>"));
    }
    out.push_str("</div>");
}

fn push_property_selector(out: &mut String, options: &[PropertyOption]) {
    if options.is_empty() {
        out.push_str(&format!("<div class=\"placeholder\">{NO_DATA}</div>"));
        return;
    }
    out.push_str("<select id=\"property-select\"><option value=\"\">Select a property</option>");
    for option in options {
        out.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            escape_html(&option.id),
            escape_html(&option.name)
        ));
    }
    out.push_str("</select>");
}
