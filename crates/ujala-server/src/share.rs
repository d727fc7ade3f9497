//! Open Graph preview pages for social sharing.
//!
//! Crawlers read the meta tags; browsers are redirected to the frontend.

use ujala_store::Article;

/// Escape text for use inside HTML attributes and element content.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn a stored media path into an absolute URL under `origin`.
fn absolute(origin: &str, path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

/// Escape for a single-quoted JavaScript string literal.
fn escape_js(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "\\u003c")
}

/// Where the share preview sends readers, and where media is served from.
#[derive(Debug, Clone)]
pub struct ShareOrigins {
    /// Origin of this server (media URLs).
    pub server: String,
    /// Origin of the web frontend (article URLs).
    pub frontend: String,
}

/// Render the preview document for `article`.
pub fn render_share_page(article: &Article, origins: &ShareOrigins) -> String {
    let title = escape_html(&article.title);
    let summary = if article.description.trim().is_empty() {
        &article.content
    } else {
        &article.description
    };
    let description = escape_html(summary);
    let page_url = format!("{}/news/{}", origins.frontend, article.slug);
    let page_url_attr = escape_html(&page_url);

    let image = article
        .image_url
        .as_deref()
        .or(article.image_path.as_deref())
        .filter(|p| !p.is_empty())
        .map(|p| escape_html(&absolute(&origins.server, p)));
    let video = article
        .video_url
        .as_deref()
        .or(article.video_path.as_deref())
        .filter(|p| !p.is_empty())
        .map(|p| escape_html(&absolute(&origins.server, p)));

    let mut meta = Vec::new();
    meta.push(format!(r#"<meta property="og:title" content="{title}" />"#));
    meta.push(format!(r#"<meta property="og:description" content="{description}" />"#));
    meta.push(format!(r#"<meta property="og:url" content="{page_url_attr}" />"#));
    let og_type = if video.is_some() { "video.other" } else { "article" };
    meta.push(format!(r#"<meta property="og:type" content="{og_type}" />"#));
    if let Some(image) = &image {
        meta.push(format!(r#"<meta property="og:image" content="{image}" />"#));
        meta.push(format!(r#"<meta name="twitter:image" content="{image}" />"#));
    }
    if let Some(video) = &video {
        meta.push(format!(r#"<meta property="og:video" content="{video}" />"#));
        meta.push(format!(r#"<meta property="og:video:secure_url" content="{video}" />"#));
        meta.push(r#"<meta property="og:video:type" content="video/mp4" />"#.to_string());
    }
    let card = if video.is_some() { "player" } else { "summary_large_image" };
    meta.push(format!(r#"<meta name="twitter:card" content="{card}" />"#));
    meta.push(format!(r#"<meta name="twitter:title" content="{title}" />"#));
    meta.push(format!(r#"<meta name="twitter:description" content="{description}" />"#));
    meta.push(format!(r#"<meta name="twitter:url" content="{page_url_attr}" />"#));
    meta.push(format!(r#"<link rel="canonical" href="{page_url_attr}" />"#));

    let redirect = escape_js(&page_url);
    let head = meta
        .iter()
        .map(|m| format!("  {m}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
{head}
</head>
<body>
  <p>Redirecting to <a href="{page_url_attr}">{page_url_attr}</a></p>
  <script>try{{location.replace('{redirect}')}}catch(e){{}}</script>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn article() -> Article {
        let now = Utc::now();
        Article {
            id: Uuid::new_v4(),
            title: "Fire at <Civil Lines> \"market\"".into(),
            slug: "fire-at-civil-lines-market".into(),
            short_id: Some("abc123defg".into()),
            description: "Crews & police on site".into(),
            content: "Full report".into(),
            category: "Moradabad ujala".into(),
            image_url: Some("/uploads/1-2.jpg".into()),
            image_path: Some("/uploads/1-2.jpg".into()),
            gallery_images: vec![],
            video_url: None,
            video_path: None,
            location: None,
            reporter_id: None,
            author: "Desk".into(),
            is_ujala: true,
            is_gallery: false,
            is_event: false,
            is_breaking: true,
            is_featured: false,
            event_date: None,
            event_venue: None,
            featured_at: None,
            approved: true,
            views: 0,
            tags: vec![],
            source: "Moradabad Ujala".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn origins() -> ShareOrigins {
        ShareOrigins {
            server: "https://api.ujala.in".into(),
            frontend: "https://ujala.in".into(),
        }
    }

    #[test]
    fn test_escapes_text() {
        let html = render_share_page(&article(), &origins());
        assert!(html.contains("Fire at &lt;Civil Lines&gt; &quot;market&quot;"));
        assert!(html.contains("Crews &amp; police on site"));
        assert!(!html.contains("<Civil Lines>"));
    }

    #[test]
    fn test_image_article() {
        let html = render_share_page(&article(), &origins());
        assert!(html.contains(r#"og:image" content="https://api.ujala.in/uploads/1-2.jpg""#));
        assert!(html.contains(r#"og:type" content="article""#));
        assert!(html.contains(r#"twitter:card" content="summary_large_image""#));
        assert!(html.contains(r#"rel="canonical" href="https://ujala.in/news/fire-at-civil-lines-market""#));
        assert!(html.contains("location.replace('https://ujala.in/news/fire-at-civil-lines-market')"));
        assert!(!html.contains("og:video"));
    }

    #[test]
    fn test_video_article() {
        let mut a = article();
        a.video_path = Some("/uploads/9-9.mp4".into());
        a.image_url = Some("https://cdn.example.com/thumb.jpg".into());
        let html = render_share_page(&a, &origins());
        assert!(html.contains(r#"og:type" content="video.other""#));
        assert!(html.contains(r#"twitter:card" content="player""#));
        assert!(html.contains(r#"og:video" content="https://api.ujala.in/uploads/9-9.mp4""#));
        assert!(html.contains(r#"og:image" content="https://cdn.example.com/thumb.jpg""#));
    }

    #[test]
    fn test_description_falls_back_to_content() {
        let mut a = article();
        a.description = "  ".into();
        let html = render_share_page(&a, &origins());
        assert!(html.contains(r#"og:description" content="Full report""#));
    }
}
