use std::fs;
use std::path::Path;

use display_assets::{EncodeError, LibraryBuilder};
use image::codecs::gif::GifEncoder;
use image::{Frame, Rgba, RgbaImage};
use serde_json::Value;

const CATALOG: &str = r#"
Catalog(
    library: (name: "test", version: "0.3.0", buildpath: Some("out"), publish: Some("published")),
    images: [
        (name: "icons", files: [(include: "icons/*.png", type: Some("GRAYSCALE"))]),
        (name: "dup", files: [(include: "dup/*/logo.png", resize: Some("1x1"))]),
        (name: "thumbs", files: [(include: "thumbs/*.png", resize: Some("8x8"), type: Some("BINARY"))]),
    ],
    animations: [(name: "anim", files: [(include: "anim/*.gif")])],
    fonts: [(name: "fonts", files: [
        (name: "mono", file: "fonts/DejaVuSansMono.ttf", size: 12, glyphs: "Ag A"),
        (name: "missing", file: "fonts/none.ttf"),
    ])],
    screens: [(
        name: "oled",
        colormode: "BINARY",
        background: "black",
        width: 128,
        height: 64,
        scale: 2.0,
        showgrid: false,
        gridsize: 8,
    )],
)
"#;

fn gray(v: u8) -> Rgba<u8> {
    Rgba([v, v, v, 255])
}

fn write_fixtures(root: &Path) {
    fs::create_dir_all(root.join("icons")).unwrap();
    fs::create_dir_all(root.join("anim")).unwrap();
    fs::create_dir_all(root.join("dup/a")).unwrap();
    fs::create_dir_all(root.join("dup/b")).unwrap();
    fs::create_dir_all(root.join("thumbs")).unwrap();
    fs::create_dir_all(root.join("fonts")).unwrap();

    let checker = RgbaImage::from_fn(2, 2, |x, y| if x == y { gray(0) } else { gray(255) });
    checker.save(root.join("icons/checker.png")).unwrap();
    fs::write(root.join("icons/broken.png"), b"definitely not a png").unwrap();

    RgbaImage::from_pixel(4, 4, gray(0))
        .save(root.join("dup/a/logo.png"))
        .unwrap();
    RgbaImage::from_pixel(4, 4, gray(255))
        .save(root.join("dup/b/logo.png"))
        .unwrap();

    RgbaImage::from_pixel(10, 7, gray(200))
        .save(root.join("thumbs/wide.png"))
        .unwrap();

    let font = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf");
    fs::copy(font, root.join("fonts/DejaVuSansMono.ttf")).unwrap();

    let gif = fs::File::create(root.join("anim/blink.gif")).unwrap();
    let mut encoder = GifEncoder::new(gif);
    encoder
        .encode_frames([0, 255].map(|v| Frame::new(RgbaImage::from_pixel(3, 2, gray(v)))))
        .unwrap();

    fs::write(root.join("catalog.ron"), CATALOG).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_build_writes_library() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_fixtures(root);

    let builder = LibraryBuilder::from_catalog_file(&root.join("catalog.ron")).unwrap();
    let report = builder.build().unwrap();
    let out = root.join("out");

    let icons = read_json(&out.join("icons/images.json"));
    assert_eq!(icons.as_array().unwrap().len(), 1);
    assert_eq!(icons[0]["id"], "img_checker");
    assert_eq!(icons[0]["path"], "icons/checker.png");
    assert_eq!(icons[0]["type"], 1);
    assert_eq!(icons[0]["width"], 2);
    assert_eq!(icons[0]["data"], serde_json::json!([0, 255, 255, 0]));
    assert!(icons[0]["dataurl"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    let anim = read_json(&out.join("anim/animations.json"));
    assert_eq!(anim[0]["id"], "anim_blink");
    assert_eq!(anim[0]["type"], 0);
    assert_eq!(anim[0]["frames"], 2);
    assert_eq!(anim[0]["data"], serde_json::json!([0x00, 0x00, 0xE0, 0xE0]));
    assert!(anim[0]["dataurl"]
        .as_str()
        .unwrap()
        .starts_with("data:image/gif;base64,"));

    let dup = read_json(&out.join("dup/images.json"));
    assert_eq!(dup.as_array().unwrap().len(), 2);
    assert_eq!(dup[0]["width"], 1);
    assert_eq!(dup[0]["data"], serde_json::json!([0, 0, 0]));
    assert_eq!(report.collisions.len(), 1);
    assert_eq!(report.collisions[0].id, "img_logo");

    let thumbs = read_json(&out.join("thumbs/images.json"));
    assert_eq!(thumbs[0]["width"], 8);
    assert_eq!(thumbs[0]["height"], 6);
    assert_eq!(thumbs[0]["data"], serde_json::to_value(vec![0xFF; 6]).unwrap());

    let fonts = read_json(&out.join("fonts/fonts.json"));
    assert_eq!(fonts.as_array().unwrap().len(), 1);
    let mono = &fonts[0];
    assert_eq!(mono["id"], "font_DejaVuSansMono");
    assert_eq!(mono["name"], "mono");
    assert_eq!(mono["height"], 12);
    assert_eq!(mono["glyphstr"], "Ag A");
    assert!(mono["ascent"].as_i64().unwrap() > 0);
    assert!(mono["descent"].as_i64().unwrap() < 0);
    let glyphs = mono["glyphs"].as_array().unwrap();
    let chars: Vec<&str> = glyphs.iter().map(|g| g["glyph"].as_str().unwrap()).collect();
    assert_eq!(chars, ["A", "g", " ", "A"]);
    let mut next = 0;
    for glyph in glyphs {
        assert_eq!(glyph["start"].as_u64().unwrap(), next);
        next += glyph["width"].as_u64().unwrap() * glyph["height"].as_u64().unwrap();
    }
    assert_eq!(glyphs[2]["width"], 0);
    assert_eq!(glyphs[0]["width"], glyphs[3]["width"]);
    assert_eq!(mono["data"].as_array().unwrap().len() as u64, next);
    assert_eq!(read_json(&out.join("screen_presets.json"))[0]["name"], "oled");

    assert_eq!(report.records, 6);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().any(|f| {
        f.path.ends_with("icons/broken.png") && matches!(f.error, EncodeError::Decode { .. })
    }));
    assert!(report.failures.iter().any(|f| {
        f.path.ends_with("fonts/none.ttf") && matches!(f.error, EncodeError::Decode { .. })
    }));

    let manifest = read_json(&out.join("manifest.json"));
    assert_eq!(manifest["name"], "test");
    assert_eq!(manifest["version"], "0.3.0");
    assert_eq!(manifest["buildpath"], "out");
    let files = manifest["files"].as_array().unwrap();
    assert_eq!(files.len(), 6);
    for file in files {
        let on_disk = fs::metadata(out.join(file["path"].as_str().unwrap())).unwrap();
        assert_eq!(file["size"], on_disk.len());
    }
    assert_eq!(files[5]["type"], "screens");

    assert!(root.join("published/manifest.json").exists());
    assert!(root.join("published/anim/animations.json").exists());
}

#[test]
fn test_invalid_format_stops_before_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"{"images": [{"name": "icons", "files": [{"include": "*.png", "type": "RGB666"}]}]}"#,
    )
    .unwrap();

    let err = LibraryBuilder::from_catalog_file(&catalog).err().unwrap();
    assert!(err.to_string().contains("RGB666"), "{err}");
    assert!(!dir.path().join("build").exists());
}
