use alloc::vec;

use super::*;
use crate::caps::{Capability, ClientCap, DeviceCap};
use crate::format::Modifier;
use crate::ioctl::*;
use crate::query::QueryConfig;
use crate::testing::*;

fn card_with_resources(states: Vec<FakeResources>) -> FakeDevice {
    FakeDevice {
        resources: Script::new(states),
        ..Default::default()
    }
}

#[test]
fn resources_two_calls_when_stable() {
    let dev = card_with_resources(vec![FakeResources {
        fbs: vec![],
        crtcs: vec![41, 42],
        connectors: vec![80],
        encoders: vec![60, 61, 62],
    }]);
    let res = dev.resources().unwrap();
    assert_eq!(res.crtc_ids, vec![CrtcId(41), CrtcId(42)]);
    assert_eq!(res.connector_ids, vec![ConnectorId(80)]);
    let encoders = [EncoderId(60), EncoderId(61), EncoderId(62)];
    assert_eq!(res.encoder_ids, encoders);
    assert!(res.fb_ids.is_empty());
    assert_eq!(res.max_width, 16384);
    assert_eq!(dev.call_count("get_resources"), 2);
}

#[test]
fn resources_hotplug_between_phases_retries() {
    let before = FakeResources {
        connectors: vec![80],
        ..Default::default()
    };
    let after = FakeResources {
        connectors: vec![80, 81],
        ..Default::default()
    };
    // Sizing sees one connector, the fetch sees two, then it settles.
    let dev = card_with_resources(vec![before, after.clone(), after]);
    let res = dev.resources().unwrap();
    assert_eq!(res.connector_ids, vec![ConnectorId(80), ConnectorId(81)]);
    assert_eq!(dev.call_count("get_resources"), 4);
}

#[test]
fn resources_give_up_when_never_stable() {
    let states = (0..20)
        .map(|i| FakeResources {
            fbs: vec![0; i],
            ..Default::default()
        })
        .collect();
    let mut dev = card_with_resources(states);
    dev.config = Some(QueryConfig::new(3));
    assert_eq!(dev.resources(), Err(Error::Unstable { attempts: 3 }));
    assert_eq!(dev.call_count("get_resources"), 6);
}

#[test]
fn connector_details() {
    let preferred = DRM_MODE_TYPE_DRIVER | DRM_MODE_TYPE_PREFERRED;
    let mut dev = FakeDevice::default();
    dev.connectors.insert(
        80,
        Script::fixed(FakeConnector {
            encoder_id: 60,
            connector_type: 11,
            connector_type_id: 1,
            connection: 1,
            mm_width: 600,
            mm_height: 340,
            subpixel: 2,
            encoders: vec![60, 61],
            modes: vec![
                mode("1920x1080", 1920, 1080, 60, DRM_MODE_TYPE_DRIVER),
                mode("2560x1440", 2560, 1440, 60, preferred),
            ],
            props: vec![(1, 0), (5, 33)],
        }),
    );
    let conn = dev.connector_state(ConnectorId(80)).unwrap();
    assert_eq!(conn.id, ConnectorId(80));
    assert_eq!(conn.connector_type, ConnectorType::HdmiA);
    assert_eq!(conn.connection_state, ConnectionState::Connected);
    assert_eq!(conn.subpixel_type, SubpixelType::HorizontalRgb);
    assert_eq!(conn.current_encoder_id, EncoderId(60));
    assert_eq!(conn.available_encoder_ids, [EncoderId(60), EncoderId(61)]);
    assert_eq!((conn.width_mm, conn.height_mm), (600, 340));
    assert_eq!(conn.modes.len(), 2);
    assert_eq!(conn.modes[0].name, "1920x1080");
    assert_eq!(conn.preferred_mode().map(|m| m.hdisplay), Some(2560));
    assert_eq!(
        conn.props,
        vec![
            ModeProp {
                prop_id: PropertyId(1),
                value: 0
            },
            ModeProp {
                prop_id: PropertyId(5),
                value: 33
            },
        ]
    );
}

#[test]
fn connector_modes_change_between_phases() {
    let mut dev = FakeDevice::default();
    let unplugged = FakeConnector {
        connection: 2,
        ..Default::default()
    };
    let plugged = FakeConnector {
        connection: 1,
        modes: vec![mode("1024x768", 1024, 768, 60, 0)],
        ..Default::default()
    };
    dev.connectors
        .insert(7, Script::new(vec![unplugged, plugged.clone(), plugged]));
    let conn = dev.connector_state(ConnectorId(7)).unwrap();
    assert_eq!(conn.connection_state, ConnectionState::Connected);
    assert_eq!(conn.modes.len(), 1);
    assert_eq!(dev.call_count("get_connector"), 4);
}

#[test]
fn missing_connector_is_an_error() {
    let dev = FakeDevice::default();
    assert_eq!(dev.connector_state(ConnectorId(3)), Err(Error::NonExist));
}

#[test]
fn encoder_details() {
    let mut dev = FakeDevice::default();
    dev.encoders.insert(60, (2, 41, 0b11, 0));
    let enc = dev.encoder_state(EncoderId(60)).unwrap();
    assert_eq!(enc.encoder_type, EncoderType::Tmds);
    assert_eq!(enc.current_crtc_id, CrtcId(41));
    assert_eq!(enc.possible_crtcs, 0b11);
    assert_eq!(dev.call_count("get_encoder"), 1);
}

#[test]
fn crtc_mode_is_optional() {
    let mut dev = FakeDevice::default();
    dev.crtcs.insert(
        41,
        FakeCrtc {
            fb_id: 90,
            gamma_size: 256,
            mode: Some(mode("1920x1080", 1920, 1080, 60, 0)),
            ..Default::default()
        },
    );
    dev.crtcs.insert(42, FakeCrtc::default());

    let active = dev.crtc_state(CrtcId(41)).unwrap();
    assert_eq!(active.fb_id, FramebufferId(90));
    let mode_name = active.mode.as_ref().map(|m| m.name.as_str());
    assert_eq!(mode_name, Some("1920x1080"));

    let idle = dev.crtc_state(CrtcId(42)).unwrap();
    assert_eq!(idle.mode, None);
}

#[test]
fn planes() {
    let mut dev = FakeDevice {
        plane_ids: Script::fixed(vec![31, 32]),
        ..Default::default()
    };
    dev.planes.insert(
        31,
        FakePlane {
            crtc_id: 41,
            fb_id: 90,
            possible_crtcs: 1,
            formats: vec![Format::XRGB8888.0, Format::ARGB8888.0],
            ..Default::default()
        },
    );
    assert_eq!(dev.plane_ids().unwrap(), vec![PlaneId(31), PlaneId(32)]);
    let plane = dev.plane_state(PlaneId(31)).unwrap();
    assert_eq!(plane.crtc_id, CrtcId(41));
    assert_eq!(plane.formats, vec![Format::XRGB8888, Format::ARGB8888]);
}

#[test]
fn object_properties_need_matching_kind() {
    let mut dev = FakeDevice::default();
    let listed = vec![(10, 1), (11, 0x0003_0000)];
    dev.objects.insert((DRM_MODE_OBJECT_PLANE, 31), listed);

    let props = dev.object_properties(PlaneId(31)).unwrap();
    assert_eq!(props.get(&PropertyId(11)), Some(&0x0003_0000));
    assert_eq!(props.len(), 2);

    let any = dev.object_properties(ObjectId::Any(31)).unwrap();
    assert_eq!(any, props);

    assert_eq!(dev.object_properties(CrtcId(31)), Err(Error::NonExist));
}

#[test]
fn enum_property_meta() {
    let mut dev = FakeDevice::default();
    dev.properties.insert(
        10,
        FakeProperty {
            name: "type",
            flags: DRM_MODE_PROP_ENUM | DRM_MODE_PROP_IMMUTABLE,
            values: vec![0, 1, 2],
            enums: vec![("Overlay", 0), ("Primary", 1), ("Cursor", 2)],
            ..Default::default()
        },
    );
    let meta = dev.property_meta(PropertyId(10)).unwrap();
    assert_eq!(meta.name, "type");
    assert_eq!(meta.property_type(), PropertyType::Enum);
    assert!(meta.is_immutable());
    assert!(!meta.is_atomic());
    assert_eq!(meta.values, vec![0, 1, 2]);
    assert_eq!(meta.enum_name(1), Some("Primary"));
    assert_eq!(meta.enum_members().map(|m| m.len()), Some(3));
    assert_eq!(meta.range(), None);
}

#[test]
fn range_property_meta() {
    let mut dev = FakeDevice::default();
    dev.properties.insert(
        11,
        FakeProperty {
            name: "SRC_X",
            flags: DRM_MODE_PROP_RANGE | DRM_MODE_PROP_ATOMIC,
            values: vec![0, u32::MAX as u64],
            ..Default::default()
        },
    );
    let meta = dev.property_meta(PropertyId(11)).unwrap();
    assert_eq!(meta.range(), Some((0, u32::MAX as u64)));
    assert!(meta.is_atomic());
    assert!(meta.enum_members.is_empty());
}

#[test]
fn blob_property_meta_uses_parallel_arrays() {
    let mut dev = FakeDevice::default();
    dev.properties.insert(
        12,
        FakeProperty {
            name: "EDID",
            flags: DRM_MODE_PROP_BLOB | DRM_MODE_PROP_IMMUTABLE,
            blobs: vec![(100, 128), (101, 256)],
            ..Default::default()
        },
    );
    let meta = dev.property_meta(PropertyId(12)).unwrap();
    assert!(meta.values.is_empty());
    assert_eq!(
        meta.blobs(),
        Some(
            &[
                PropertyBlob {
                    id: BlobId(100),
                    size: 128
                },
                PropertyBlob {
                    id: BlobId(101),
                    size: 256
                },
            ][..]
        )
    );
}

#[test]
fn blob_contents() {
    let mut dev = FakeDevice::default();
    dev.blobs.insert(100, vec![1, 2, 3, 4, 5]);
    let contents = dev.property_blob(BlobId(100)).unwrap();
    assert_eq!(contents, vec![1, 2, 3, 4, 5]);
    assert_eq!(dev.call_count("get_blob"), 2);
    assert_eq!(dev.property_blob(BlobId(7)), Err(Error::NonExist));
}

#[test]
fn null_blob_needs_no_request() {
    let dev = FakeDevice::default();
    assert_eq!(dev.property_blob(BlobId(0)).unwrap(), Vec::<u8>::new());
    assert_eq!(dev.call_count("get_blob"), 0);
}

fn plane_with_properties() -> FakeDevice {
    let mut dev = FakeDevice::default();
    dev.objects.insert(
        (DRM_MODE_OBJECT_PLANE, 31),
        vec![(10, 1), (11, 0x0003_0000), (12, 0), (13, 41), (14, 200)],
    );
    dev.properties.insert(
        10,
        FakeProperty {
            name: "type",
            flags: DRM_MODE_PROP_ENUM | DRM_MODE_PROP_IMMUTABLE,
            values: vec![0, 1, 2],
            enums: vec![("Overlay", 0), ("Primary", 1), ("Cursor", 2)],
            ..Default::default()
        },
    );
    dev.properties.insert(
        11,
        FakeProperty {
            name: "SRC_X",
            flags: DRM_MODE_PROP_RANGE | DRM_MODE_PROP_ATOMIC,
            values: vec![0, u32::MAX as u64],
            ..Default::default()
        },
    );
    dev.properties.insert(
        12,
        FakeProperty {
            name: "FB_DAMAGE_CLIPS",
            flags: DRM_MODE_PROP_BLOB | DRM_MODE_PROP_ATOMIC,
            ..Default::default()
        },
    );
    dev.properties.insert(
        13,
        FakeProperty {
            name: "CRTC_ID",
            flags: DRM_MODE_PROP_OBJECT | DRM_MODE_PROP_ATOMIC,
            values: vec![DRM_MODE_OBJECT_CRTC as u64],
            ..Default::default()
        },
    );
    dev.properties.insert(
        14,
        FakeProperty {
            name: "IN_FORMATS",
            flags: DRM_MODE_PROP_BLOB | DRM_MODE_PROP_IMMUTABLE,
            ..Default::default()
        },
    );
    dev.blobs.insert(200, in_formats_blob());
    dev
}

/// Two formats, each usable with the linear modifier, and only the second
/// usable with a vendor tiling modifier.
fn in_formats_blob() -> Vec<u8> {
    let mut b = Vec::new();
    for v in [1_u32, 0, 2, 24, 2, 32] {
        b.extend_from_slice(&v.to_ne_bytes());
    }
    b.extend_from_slice(&Format::XRGB8888.0.to_ne_bytes());
    b.extend_from_slice(&Format::ARGB8888.0.to_ne_bytes());
    let vendor = 0x0100_0000_0000_0001;
    for (mask, offset, modifier) in [(0b11_u64, 0_u32, 0_u64), (0b10, 0, vendor)] {
        b.extend_from_slice(&mask.to_ne_bytes());
        b.extend_from_slice(&offset.to_ne_bytes());
        b.extend_from_slice(&0_u32.to_ne_bytes());
        b.extend_from_slice(&modifier.to_ne_bytes());
    }
    b
}

#[test]
fn object_property_values_decodes_everything() {
    let dev = plane_with_properties();
    let props = dev.object_property_values(PlaneId(31)).unwrap();
    assert_eq!(props.len(), 5);

    let typ = &props["type"];
    assert_eq!(typ.typ, PropertyType::Enum);
    assert!(typ.immutable);
    assert_eq!(typ.value, PropertyValue::Unsigned(1));
    assert_eq!(typ.semantic, None);
    assert_eq!(typ.enum_members.len(), 3);
    assert_eq!(typ.enum_name(), Some("Primary"));

    let src_x = &props["SRC_X"];
    assert!(src_x.atomic);
    assert!(src_x.enum_members.is_empty());
    assert_eq!(src_x.enum_name(), None);
    assert_eq!(src_x.raw_value, 0x0003_0000);
    assert_eq!(src_x.semantic, Some(Ok(SemanticValue::Integer(3))));

    let damage = &props["FB_DAMAGE_CLIPS"];
    assert_eq!(damage.value, PropertyValue::Blob(None));
    assert!(damage.blob.is_empty());

    let crtc = &props["CRTC_ID"];
    assert_eq!(crtc.value, PropertyValue::Object(ObjectId::Any(41)));

    let in_formats = &props["IN_FORMATS"];
    assert_eq!(in_formats.value, PropertyValue::Blob(Some(BlobId(200))));
    assert_eq!(in_formats.blob, in_formats_blob());
    let Some(Ok(SemanticValue::FormatModifiers(map))) = &in_formats.semantic else {
        panic!("IN_FORMATS not decoded: {:?}", in_formats.semantic);
    };
    assert_eq!(
        map.get(&Modifier::LINEAR),
        Some(&vec![Format::XRGB8888, Format::ARGB8888])
    );
    assert_eq!(
        map.get(&Modifier(0x0100_0000_0000_0001)),
        Some(&vec![Format::ARGB8888])
    );

    // Only the one non-null blob is fetched, with a sizing and a fill request.
    assert_eq!(dev.call_count("get_blob"), 2);
    // Enum metadata travels with each value, so it isn't requested again.
    assert_eq!(dev.call_count("get_property"), 10);
}

#[test]
fn property_on_unexpected_object_kind_is_not_decoded() {
    let mut dev = plane_with_properties();
    let props = dev.objects[&(DRM_MODE_OBJECT_PLANE, 31)].clone();
    dev.objects.insert((DRM_MODE_OBJECT_CRTC, 41), props);
    let props = dev.object_property_values(CrtcId(41)).unwrap();
    assert_eq!(props["SRC_X"].semantic, None);
    assert_eq!(props["SRC_X"].value, PropertyValue::Unsigned(0x0003_0000));
    assert_eq!(props["IN_FORMATS"].semantic, None);
    // The raw blob is still fetched even though it isn't decoded.
    assert_eq!(props["IN_FORMATS"].blob, in_formats_blob());
}

#[test]
fn malformed_blob_keeps_raw_bytes() {
    let mut dev = plane_with_properties();
    dev.blobs.insert(200, vec![2, 0, 0, 0]);
    let props = dev.object_property_values(PlaneId(31)).unwrap();
    let in_formats = &props["IN_FORMATS"];
    assert_eq!(in_formats.blob, vec![2, 0, 0, 0]);
    assert!(matches!(in_formats.semantic, Some(Err(_))));
}

#[test]
fn crtc_mode_id_blob() {
    let mut dev = FakeDevice::default();
    let props = vec![(20, 300)];
    dev.objects.insert((DRM_MODE_OBJECT_CRTC, 41), props);
    dev.properties.insert(
        20,
        FakeProperty {
            name: "MODE_ID",
            flags: DRM_MODE_PROP_BLOB | DRM_MODE_PROP_ATOMIC,
            ..Default::default()
        },
    );
    let raw = mode("800x600", 800, 600, 75, DRM_MODE_TYPE_USERDEF);
    let bytes = unsafe {
        core::slice::from_raw_parts(
            &raw as *const DrmModeInfo as *const u8,
            core::mem::size_of::<DrmModeInfo>(),
        )
    };
    dev.blobs.insert(300, bytes.to_vec());

    let props = dev.object_property_values(CrtcId(41)).unwrap();
    let Some(Ok(SemanticValue::Mode(mode))) = &props["MODE_ID"].semantic else {
        panic!("MODE_ID not decoded: {:?}", props["MODE_ID"].semantic);
    };
    assert_eq!(mode, &ModeInfo::from(&raw));
    assert_eq!(mode.name, "800x600");
    assert_eq!(mode.vrefresh, 75);
}

#[test]
fn idle_crtc_has_null_mode_id() {
    let mut dev = FakeDevice::default();
    let props = vec![(20, 0)];
    dev.objects.insert((DRM_MODE_OBJECT_CRTC, 42), props);
    dev.properties.insert(
        20,
        FakeProperty {
            name: "MODE_ID",
            flags: DRM_MODE_PROP_BLOB | DRM_MODE_PROP_ATOMIC,
            ..Default::default()
        },
    );

    let props = dev.object_property_values(CrtcId(42)).unwrap();
    let mode_id = &props["MODE_ID"];
    assert_eq!(mode_id.value, PropertyValue::Blob(None));
    assert!(mode_id.blob.is_empty());
    assert_eq!(mode_id.semantic, None);
    assert_eq!(dev.call_count("get_blob"), 0);
}

#[test]
fn driver_version_strings() {
    let dev = FakeDevice {
        driver: FakeDriver {
            major: 1,
            minor: 2,
            patch: 3,
            name: "i915",
            date: "20201103",
            desc: "Intel Graphics",
        },
        ..Default::default()
    };
    let v = dev.driver_version().unwrap();
    assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
    assert_eq!(v.name, "i915");
    assert_eq!(v.desc, "Intel Graphics");
    assert_eq!(alloc::format!("{v}"), "1.2.3 (20201103)");
    assert_eq!(dev.call_count("version"), 2);
}

#[test]
fn capability_queries() {
    let mut dev = FakeDevice::default();
    dev.caps.insert(DeviceCap::DumbBuffer.as_raw(), 1);
    dev.client_caps.push(ClientCap::UniversalPlanes.as_raw());

    let dumb = dev.device_cap(DeviceCap::DumbBuffer);
    assert_eq!(dumb, Ok(Capability::Supported(1)));
    let syncobj = dev.device_cap(DeviceCap::SyncObj);
    assert_eq!(syncobj, Ok(Capability::Unsupported));
    assert_eq!(
        dev.set_client_cap(ClientCap::UniversalPlanes, 1),
        Ok(Capability::Supported(()))
    );
    assert_eq!(
        dev.set_client_cap(ClientCap::WritebackConnectors, 1),
        Ok(Capability::Unsupported)
    );
    assert_eq!(
        *dev.client_caps_set.borrow(),
        vec![(ClientCap::UniversalPlanes.as_raw(), 1)]
    );
}

#[test]
fn capability_errors_other_than_einval_propagate() {
    let dev = FakeDevice {
        cap_failure: Some(Error::Permission),
        ..Default::default()
    };
    let dumb = dev.device_cap(DeviceCap::DumbBuffer);
    assert_eq!(dumb, Err(Error::Permission));
    assert_eq!(
        dev.set_client_cap(ClientCap::Atomic, 1),
        Err(Error::Permission)
    );
}

#[test]
fn queries_through_a_reference() {
    let dev = card_with_resources(vec![FakeResources::default()]);
    let by_ref: &dyn DrmDevice = &dev;
    assert!(by_ref.resources().unwrap().crtc_ids.is_empty());
}
