use hints_dom::{HeadlessDom, OverlayDom, Point, Rect, StyleSheetStatus, TextMetrics, Viewport, overlaps};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a fixed container with a shadow-scoped stylesheet through the
/// trait only, the way the renderer does.
fn container(dom: &mut HeadlessDom, css: &str) -> (hints_dom::NodeKey, hints_dom::NodeKey) {
    let host = dom.create_element("div");
    dom.set_id(host, "overlay");
    for (property, value) in [("position", "fixed"), ("left", "0px"), ("top", "0px"), ("width", "640px"), ("height", "480px")] {
        dom.set_style(host, property, value, true);
    }
    let root = dom.attach_shadow(host);
    assert_eq!(dom.insert_stylesheet(root, css), StyleSheetStatus::Applied);
    let html = dom.document_element().unwrap();
    dom.append_child(html, host);
    (host, root)
}

#[test]
fn labels_measure_with_custom_metrics_and_nested_spans() {
    init();
    let metrics = TextMetrics {
        char_width: 10.0,
        line_height: 20.0,
    };
    let mut dom = HeadlessDom::new(Viewport::new(640.0, 480.0)).with_metrics(metrics);
    let (_, root) = container(&mut dom, ".label { position: absolute; padding: 1px 3px; }");

    let label = dom.create_element("div");
    dom.set_class_name(label, "label");
    let span = dom.create_element("span");
    dom.set_text_content(span, "ab");
    dom.append_child(label, span);
    let rest = dom.create_text("c");
    dom.append_child(label, rest);
    dom.set_style(label, "left", "100px", false);
    dom.set_style(label, "top", "50px", false);
    dom.append_child(root, label);

    assert_eq!(dom.text_content(label), "abc");
    assert_eq!(
        dom.bounding_client_rect(label),
        Rect::from_origin_size(100.0, 50.0, 36.0, 22.0)
    );
}

#[test]
fn stylesheet_scope_is_the_shadow_tree() {
    init();
    let mut dom = HeadlessDom::new(Viewport::new(640.0, 480.0));
    let (_, root) = container(&mut dom, ".label { position: absolute; left: 7px; }");

    let inside = dom.create_element("div");
    dom.set_class_name(inside, "label");
    dom.append_child(root, inside);

    let outside = dom.create_element("div");
    dom.set_class_name(outside, "label");
    let body = dom.body().unwrap();
    dom.append_child(body, outside);

    assert_eq!(dom.computed_value(inside, "left").as_deref(), Some("7px"));
    assert_eq!(dom.computed_value(outside, "left"), None);
}

#[test]
fn removing_the_host_disconnects_the_shadow_tree() {
    init();
    let mut dom = HeadlessDom::new(Viewport::new(640.0, 480.0));
    dom.set_document_origin(Point::new(0.0, 12.0));
    let (host, root) = container(&mut dom, "");
    let label = dom.create_element("div");
    dom.append_child(root, label);
    assert!(dom.is_connected(label));
    assert_eq!(dom.elements_with_id("overlay"), vec![host]);
    assert_eq!(dom.bounding_client_rect(host).top, 12.0);

    dom.remove(host);
    assert!(!dom.is_connected(label));
    assert!(dom.elements_with_id("overlay").is_empty());
    assert_eq!(dom.bounding_client_rect(label), Rect::default());
    assert!(overlaps(&Rect::default(), &Rect::default()));
}
