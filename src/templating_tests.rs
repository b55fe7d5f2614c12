use crate::templating::TemplateEngine;
use std::fs;
use tempfile::TempDir;

fn engine_over(temp: &TempDir) -> TemplateEngine {
    TemplateEngine::new(temp.path().to_path_buf())
}

#[tokio::test]
async fn renders_template_with_globals() {
    let temp = TempDir::new().unwrap();
    let pages = temp.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    fs::write(pages.join("hello.html.liquid"), "Hello, {{ name }}!").unwrap();

    let engine = engine_over(&temp);
    let html = engine
        .render_template(
            "pages/hello.html.liquid",
            liquid::object!({"name": "world"}),
        )
        .await
        .unwrap();
    assert_eq!(html, "Hello, world!");
}

#[tokio::test]
async fn partials_are_included_with_the_page_scope() {
    let temp = TempDir::new().unwrap();
    let pages = temp.path().join("pages");
    let partials = temp.path().join("partials");
    fs::create_dir_all(&pages).unwrap();
    fs::create_dir_all(&partials).unwrap();
    fs::write(
        partials.join("_head.html.liquid"),
        "<header>{{ title }}</header>",
    )
    .unwrap();
    fs::write(
        pages.join("page.html.liquid"),
        "{% include \"_head.html.liquid\" %}<p>body</p>",
    )
    .unwrap();

    let engine = engine_over(&temp);
    let html = engine
        .render_template("pages/page.html.liquid", liquid::object!({"title": "T"}))
        .await
        .unwrap();
    assert_eq!(html, "<header>T</header><p>body</p>");
}

#[tokio::test]
async fn missing_template_is_an_error() {
    let temp = TempDir::new().unwrap();
    let engine = engine_over(&temp);

    let result = engine
        .render_template("pages/nope.html.liquid", liquid::object!({}))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unchanged_template_is_served_from_cache() {
    let temp = TempDir::new().unwrap();
    let pages = temp.path().join("pages");
    fs::create_dir_all(&pages).unwrap();
    fs::write(pages.join("static.html.liquid"), "same").unwrap();

    let engine = engine_over(&temp);
    for _ in 0..3 {
        let html = engine
            .render_template("pages/static.html.liquid", liquid::object!({}))
            .await
            .unwrap();
        assert_eq!(html, "same");
    }
}
