use std::collections::BTreeMap;

use drm_query::{
    modeset::{ObjectId, ObjectProperty, PropertyType, PropertyValue, SemanticValue},
    result::Error,
    Capability, Card, ClientCap, DeviceCap, DrmDevice, ModesetDevice,
};

fn main() -> std::io::Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/dri/card0".to_string());
    let path = std::ffi::CString::new(path);
    let path = path.map_err(std::io::Error::other)?;
    let card = Card::open(&path).map_err(map_init_err)?;

    show_driver(&card).map_err(map_err)?;

    // Without this the kernel hides primary and cursor planes.
    if card
        .set_client_cap(ClientCap::UniversalPlanes, 1)
        .map_err(map_err)?
        == Capability::Unsupported
    {
        println!("(universal planes not supported; only overlay planes are listed)");
    }
    // Makes the atomic-only properties visible, where supported.
    let _ = card.set_client_cap(ClientCap::Atomic, 1).map_err(map_err)?;

    show_resources(&card).map_err(map_err)
}

fn show_driver(card: &Card) -> Result<(), Error> {
    let v = card.driver_version()?;
    println!("Driver: {} ({}) version {v}", v.name, v.desc);
    for cap in DeviceCap::ALL {
        match card.device_cap(cap)? {
            Capability::Supported(value) => println!("  {cap} = {value}"),
            Capability::Unsupported => println!("  {cap} unsupported"),
        }
    }
    println!();
    Ok(())
}

fn show_resources(card: &Card) -> Result<(), Error> {
    let res = card.resources()?;
    println!(
        "Framebuffer size limits: {}x{} to {}x{}",
        res.min_width, res.min_height, res.max_width, res.max_height
    );
    println!();

    for conn_id in res.connector_ids {
        let conn = card.connector_state(conn_id)?;
        println!(
            "Connector #{conn_id}: {:?}-{} ({:?})",
            conn.connector_type, conn.connector_type_id, conn.connection_state
        );
        for mode in &conn.modes {
            println!(
                "  mode {} {}x{}@{}",
                mode.name, mode.hdisplay, mode.vdisplay, mode.vrefresh
            );
        }
        show_properties(card, conn_id.into())?;
        println!();
    }

    for enc_id in res.encoder_ids {
        let enc = card.encoder_state(enc_id)?;
        println!(
            "Encoder #{enc_id}: {:?}, CRTC #{}",
            enc.encoder_type, enc.current_crtc_id
        );
        println!();
    }

    for crtc_id in res.crtc_ids {
        let crtc = card.crtc_state(crtc_id)?;
        match &crtc.mode {
            Some(mode) => println!("CRTC #{crtc_id}: {} on FB #{}", mode.name, crtc.fb_id),
            None => println!("CRTC #{crtc_id}: inactive"),
        }
        show_properties(card, crtc_id.into())?;
        println!();
    }

    for plane_id in card.plane_ids()? {
        let plane = card.plane_state(plane_id)?;
        print!("Plane #{plane_id}:");
        for format in &plane.formats {
            print!(" {format}");
        }
        println!();
        show_properties(card, plane_id.into())?;
        println!();
    }

    Ok(())
}

fn show_properties(card: &Card, obj_id: ObjectId) -> Result<(), Error> {
    let props = card.object_property_values(obj_id)?;
    for (name, prop) in &props {
        print!("  {name}: ");
        show_property_value(prop);
    }
    Ok(())
}

fn show_property_value(prop: &ObjectProperty) {
    match &prop.semantic {
        Some(Ok(SemanticValue::Integer(v))) => println!("{v}"),
        Some(Ok(SemanticValue::FormatModifiers(map))) => {
            println!();
            for (modifier, formats) in map {
                let formats: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
                println!("    {modifier}: {}", formats.join(" "));
            }
        }
        Some(Ok(SemanticValue::Mode(mode))) => println!("{}", mode.name),
        Some(Ok(SemanticValue::Formats(formats))) => {
            let formats: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
            println!("{}", formats.join(" "));
        }
        Some(Ok(SemanticValue::Path(path))) => println!("{path:?}"),
        Some(Err(e)) => println!("{} bytes (undecodable: {e})", prop.blob.len()),
        None => match prop.value {
            PropertyValue::Blob(None) => println!("(no blob)"),
            PropertyValue::Blob(Some(id)) => println!("blob #{id}, {} bytes", prop.blob.len()),
            PropertyValue::Object(id) => println!("{id}"),
            PropertyValue::Signed(v) => println!("{v}"),
            PropertyValue::Unsigned(v) => match prop.typ {
                PropertyType::Enum | PropertyType::Bitmask => {
                    println!("{}", enum_value_text(prop, v))
                }
                _ => println!("{v}"),
            },
        },
    }
}

fn enum_value_text(prop: &ObjectProperty, v: u64) -> String {
    if prop.typ != PropertyType::Bitmask {
        return match prop.enum_name() {
            Some(name) => name.to_string(),
            None => format!("out-of-range value {v}"),
        };
    }
    // Bitmask members are bit positions.
    let names: BTreeMap<u64, &str> = prop
        .enum_members
        .iter()
        .map(|m| (m.value, m.name.as_str()))
        .collect();
    let mut parts = Vec::new();
    let mut valid = 0_u64;
    for (bit, name) in &names {
        let mask = 1_u64.checked_shl(*bit as u32).unwrap_or(0);
        if v & mask != 0 {
            parts.push(name.to_string());
        }
        valid |= mask;
    }
    let invalid = v & !valid;
    if invalid != 0 {
        parts.push(format!("{invalid:#x}"));
    }
    parts.join(" | ")
}

fn map_init_err(e: drm_query::result::InitError) -> std::io::Error {
    let e: linux_io::result::Error = e.into();
    e.into_std_io_error()
}

fn map_err(e: drm_query::result::Error) -> std::io::Error {
    let e: linux_io::result::Error = e.into();
    e.into_std_io_error()
}
