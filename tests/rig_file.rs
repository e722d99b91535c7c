//! Tests for reading and writing hierarchy and pose group files

use armature::{
    hierarchy::Hierarchy,
    pose::HierarchyPoseGroup,
    rig_file,
    spatial_pose::{EulerOrder, PoseChannel},
    ArmError, ErrorKind,
};
use nalgebra_glm as glm;
use std::{io::Cursor, sync::Arc};

fn hierarchy() -> Arc<Hierarchy> {
    let mut h = Hierarchy::new(3, &[]).unwrap();
    h.set_node(0, None, "pelvis").unwrap();
    h.set_node(1, Some(0), "thigh_l").unwrap();
    h.set_node(2, Some(0), "thigh_r").unwrap();
    Arc::new(h)
}

fn group(h: &Arc<Hierarchy>) -> HierarchyPoseGroup {
    let mut group = HierarchyPoseGroup::new(h, 2).unwrap();
    for (i, pose) in group.poses_mut().iter_mut().enumerate() {
        let f = i as f32;
        pose.rotate = glm::vec4(f, 0.0, -f, 0.0);
        pose.translate = glm::vec4(0.0, f * 0.5, 0.0, 0.0);
        pose.user = glm::vec4(f, f, f, f);
    }
    group
        .set_channel(1, PoseChannel::ROTATE_XYZ | PoseChannel::TRANSLATE_Y)
        .unwrap();
    group.set_order(2, EulerOrder::Zxy).unwrap();
    group
}

#[test]
fn hierarchy_round_trip() {
    let h = hierarchy();
    let mut bytes = Vec::new();
    assert_eq!(rig_file::write_hierarchy(&mut bytes, &h).unwrap(), 3);
    assert_eq!(&bytes[..4], &3_i32.to_le_bytes());
    // "pelvis", index 0 and no parent
    assert_eq!(bytes[4], 6);
    assert_eq!(&bytes[11..15], &0_i32.to_le_bytes());
    assert_eq!(&bytes[15..19], &(-1_i32).to_le_bytes());

    let loaded = rig_file::read_hierarchy(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(loaded, *h);
}

#[test]
fn pose_group_round_trip() {
    let h = hierarchy();
    let group = group(&h);
    let mut bytes = Vec::new();
    assert_eq!(rig_file::write_pose_group(&mut bytes, &group).unwrap(), 6);
    assert_eq!(bytes.len(), 4 + 6 * 16 * 4 + 3 * 4 + 3 * 4);

    let loaded = rig_file::read_pose_group(&mut Cursor::new(bytes), &h).unwrap();
    assert_eq!(loaded.hpose_count(), 2);
    assert_eq!(loaded.poses(), group.poses());
    assert_eq!(loaded.channels(), group.channels());
    assert_eq!(loaded.orders(), group.orders());
    assert!(Arc::ptr_eq(loaded.hierarchy().unwrap(), &h));

    assert!(matches!(
        rig_file::write_pose_group(&mut Vec::new(), &HierarchyPoseGroup::default()),
        Err(ArmError::NotInitialized)
    ));
}

#[test]
fn save_and_load() {
    let dir = std::env::temp_dir();
    let id = std::process::id();
    let h = hierarchy();
    let group = group(&h);

    let h_path = dir.join(format!("armature_{id}.hierarchy"));
    rig_file::save_hierarchy(&h_path, &h).unwrap();
    let loaded = Arc::new(rig_file::load_hierarchy(&h_path).unwrap());
    assert_eq!(loaded.node_names(), vec!["pelvis", "thigh_l", "thigh_r"]);

    let g_path = dir.join(format!("armature_{id}.poses"));
    rig_file::save_pose_group(&g_path, &group).unwrap();
    let loaded_group = rig_file::load_pose_group(&g_path, &loaded).unwrap();
    assert_eq!(loaded_group.poses(), group.poses());

    std::fs::remove_file(h_path).unwrap();
    std::fs::remove_file(g_path).unwrap();

    let missing = dir.join(format!("armature_{id}.missing"));
    let e = rig_file::load_hierarchy(&missing).unwrap_err();
    assert!(matches!(e, ArmError::StdIoError(_)));
    assert_eq!(e.kind(), ErrorKind::Io);
}

#[test]
fn truncated_input() {
    let h = hierarchy();
    let mut bytes = Vec::new();
    rig_file::write_hierarchy(&mut bytes, &h).unwrap();
    bytes.truncate(bytes.len() - 2);
    assert!(matches!(
        rig_file::read_hierarchy(&mut Cursor::new(bytes)),
        Err(ArmError::FileTooShort)
    ));

    let mut bytes = Vec::new();
    rig_file::write_pose_group(&mut bytes, &group(&h)).unwrap();
    bytes.truncate(40);
    assert!(matches!(
        rig_file::read_pose_group(&mut Cursor::new(bytes), &h),
        Err(ArmError::FileTooShort)
    ));
}

#[test]
fn invalid_contents() {
    let h = hierarchy();
    let mut bytes = Vec::new();
    rig_file::write_pose_group(&mut bytes, &group(&h)).unwrap();
    let last = bytes.len() - 4;
    bytes[last..].copy_from_slice(&99_i32.to_le_bytes());
    assert!(matches!(
        rig_file::read_pose_group(&mut Cursor::new(bytes), &h),
        Err(ArmError::InvalidFile)
    ));

    assert!(matches!(
        rig_file::read_hierarchy(&mut Cursor::new(0_i32.to_le_bytes())),
        Err(ArmError::InvalidFile)
    ));

    // A child stored before its parent
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2_i32.to_le_bytes());
    for (name, index, parent) in [("a", 0_i32, 1_i32), ("b", 1, -1)] {
        bytes.push(1);
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(&index.to_le_bytes());
        bytes.extend_from_slice(&parent.to_le_bytes());
    }
    let e = rig_file::read_hierarchy(&mut Cursor::new(bytes)).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvariantViolation);
}

#[test]
fn declared_counts_need_their_data() {
    let h = hierarchy();
    assert!(matches!(
        rig_file::read_pose_group(&mut Cursor::new(i32::MAX.to_le_bytes()), &h),
        Err(ArmError::FileTooShort)
    ));

    // One node whose name claims close to 4 GiB
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1_i32.to_le_bytes());
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    bytes.extend_from_slice(b"root");
    assert!(matches!(
        rig_file::read_hierarchy(&mut Cursor::new(bytes)),
        Err(ArmError::FileTooShort)
    ));
}
