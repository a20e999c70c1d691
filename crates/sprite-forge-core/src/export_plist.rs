use crate::model::Atlas;

/// Build a basic Apple plist (XML) with frames in a dict keyed by name and
/// the sheet file name and size in meta.
pub fn to_plist(atlas: &Atlas) -> String {
    let mut s = String::new();
    s.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>frames</key>
  <dict>
"#);
    for (name, fr) in &atlas.frames {
        let frame = format!("{{{{{},{}}},{{{},{}}}}}", fr.x, fr.y, fr.w, fr.h);
        let source = format!("{{{{0,0}},{{{},{}}}}}", fr.w, fr.h);
        s.push_str(&format!(
            "    <key>{}</key>\n    <dict>\n      <key>frame</key><string>{}</string>\n      <key>rotated</key><false />\n      <key>trimmed</key><false />\n      <key>spriteSourceSize</key><string>{}</string>\n      <key>sourceSize</key><string>{{{}, {}}}</string>\n    </dict>\n",
            xml_escape(name),
            frame,
            source,
            fr.source_size.0, fr.source_size.1,
        ));
    }
    s.push_str("  </dict>\n");
    s.push_str("  <key>meta</key>\n  <dict>\n");
    s.push_str(&format!(
        "    <key>app</key><string>sprite-forge</string>\n    <key>version</key><string>{}</string>\n    <key>format</key><string>RGBA8888</string>\n    <key>scale</key><real>1.00</real>\n    <key>premultipliedAlpha</key><false />\n    <key>textureFileName</key><string>{}</string>\n    <key>realTextureFileName</key><string>{}</string>\n    <key>size</key><string>{{{}, {}}}</string>\n",
        env!("CARGO_PKG_VERSION"),
        xml_escape(&atlas.sheet.image_file_name),
        xml_escape(&atlas.sheet.image_file_name),
        atlas.sheet.width, atlas.sheet.height,
    ));
    s.push_str("  </dict>\n</dict>\n</plist>\n");
    s
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
