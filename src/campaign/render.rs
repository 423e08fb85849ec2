//! HTML rendering for approved variants.

use super::model::{EmailBody, EmailVariant};

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Feature modules and main call to action.
pub fn render_body(body: &EmailBody) -> String {
    let mut html = String::new();

    for module in body.modules() {
        html.push_str(&format!(
            r#"<div style="margin-bottom: 30px;">
  <h2 style="color: #0056b3; font-size: 22px; margin-bottom: 10px;">{title}</h2>
  <p style="font-size: 16px; line-height: 1.6; color: #333333;">{content}</p>
  <a href="{link}" style="display: inline-block; padding: 10px 20px; background-color: #0056b3; color: #ffffff; text-decoration: none; border-radius: 5px;">{cta}</a>
</div>
"#,
            title = escape_html(&module.title),
            content = escape_html(&module.content),
            link = escape_html(&module.cta_link),
            cta = escape_html(&module.cta_text),
        ));
    }

    html.push_str(&format!(
        r#"<div style="text-align: center; margin-top: 40px;">
  <a href="{link}" style="display: inline-block; padding: 15px 30px; background-color: #000000; color: #ffffff; text-decoration: none; font-size: 18px; border-radius: 5px;">{cta}</a>
</div>
"#,
        link = escape_html(body.main_cta_link()),
        cta = escape_html(body.main_cta()),
    ));

    html
}

/// Full standalone HTML document for a variant.
pub fn render_email(variant: &EmailVariant) -> String {
    let subject = escape_html(variant.subject_line.as_str());
    let preheader = escape_html(variant.pre_header.as_str());
    let body = render_body(&variant.layout);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{subject}</title>
<style type="text/css">
  body {{ margin: 0; padding: 0; font-family: Arial, sans-serif; font-size: 16px; line-height: 1.6; color: #333333; }}
  table {{ border-collapse: collapse; }}
  .preheader {{ display: none !important; }}
  @media only screen and (max-width: 600px) {{ table {{ width: 100% !important; }} }}
</style>
</head>
<body>
<span class="preheader" style="display: none !important;">{preheader}</span>
<table width="100%" border="0" cellspacing="0" cellpadding="0" style="max-width: 600px; margin: 0 auto;">
<tr>
<td style="padding: 20px;">
<h1 style="color: #0056b3; font-size: 28px; margin-bottom: 20px;">{subject}</h1>
<p style="font-size: 18px; line-height: 1.6; color: #666666; margin-bottom: 30px;">{preheader}</p>
{body}</td>
</tr>
<tr>
<td style="background-color: #f4f4f4; padding: 20px; text-align: center; font-size: 14px; color: #666666;">
You are receiving this email because you joined our mailing list.
<a href="#" style="color: #0056b3;">Unsubscribe</a>
</td>
</tr>
</table>
</body>
</html>
"##
    )
}
