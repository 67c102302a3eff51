/// HTML rendering of a `PageView`.
///
/// Every value that reaches the markup comes out of `selector::view`, which
/// only ever produces mode tags, digits and fixed punctuation.

use crate::selector::{GridRow, ModeLink, PageView};
use std::fmt::Write;

const PAGE_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Gaussian Beam Modes</title>
    <style>
      body { margin: 0; padding: 16px; background: #0b0c10; color: #e6e6e6; font-family: "Segoe UI", sans-serif; }
      #modes { display: flex; gap: 8px; margin-bottom: 12px; }
      #modes a { padding: 6px 14px; border: 1px solid #2a2f36; border-radius: 6px; color: #e6e6e6; text-decoration: none; }
      #modes a.selected { background: #1a2736; border-color: #3c6a9e; color: #cbe3ff; }
      #mode-image { display: block; max-width: 100%; margin-bottom: 12px; }
      #grid { border-collapse: collapse; }
      #grid td { padding: 0; }
      #grid a { display: block; padding: 4px 8px; color: #111; text-decoration: none; font-size: 12px; }
      #grid td.selected a { background: #111; color: #fff; }
    </style>
  </head>
  <body>
    <div id="modes">
{{MODES}}
    </div>
    <img id="mode-image" src="{{IMAGE}}" alt="{{ALT}}" />
    <table id="grid">
{{GRID}}
    </table>
  </body>
</html>
"##;

pub fn render_html(view: &PageView) -> String {
    PAGE_HTML
        .replace("{{MODES}}", &mode_links_html(&view.mode_links))
        .replace("{{IMAGE}}", &view.image_src)
        .replace("{{ALT}}", &view.selection.to_string())
        .replace("{{GRID}}", &grid_html(&view.grid))
}

fn mode_links_html(links: &[ModeLink]) -> String {
    let mut out = String::new();
    for link in links {
        let class = if link.active { "mode selected" } else { "mode" };
        let _ = writeln!(
            out,
            r#"      <a id="{mode}" class="{class}" href="{href}">{mode}</a>"#,
            mode = link.mode,
            href = link.href,
        );
    }
    out.trim_end().to_string()
}

fn grid_html(rows: &[GridRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, r#"      <tr style="background-color: {};">"#, row.background);
        for cell in &row.cells {
            let class = if cell.active { r#" class="selected""# } else { "" };
            let _ = writeln!(
                out,
                r#"        <td{class}><a href="{}">{}</a></td>"#,
                cell.href, cell.label
            );
        }
        let _ = writeln!(out, "      </tr>");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{parse, view, GRID_SIZE};

    #[test]
    fn page_shows_selected_image_and_mode() {
        let html = render_html(&view(parse(Some("?LG_3_7"))));
        assert!(html.contains(r#"src="img/LG/3_7.png""#));
        assert!(html.contains(r#"<a id="LG" class="mode selected" href="?LG_3_7">LG</a>"#));
        assert!(html.contains(r#"<a id="HG" class="mode" href="?HG_3_7">HG</a>"#));
        assert!(html.contains(r#"<td class="selected"><a href="?LG_3_7">3,7</a></td>"#));
        assert_eq!(html.matches(r#"class="selected""#).count(), 1);
    }

    #[test]
    fn grid_has_every_cell_once() {
        let html = render_html(&view(parse(None)));
        assert_eq!(html.matches("<tr ").count(), GRID_SIZE as usize);
        assert_eq!(html.matches("<td").count(), (GRID_SIZE * GRID_SIZE) as usize);
        assert!(html.contains("background-color: hsl(50, 100%, 80%);"));
        assert!(!html.contains("{{"));
    }
}
