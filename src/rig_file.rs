//! Binary files for hierarchies and pose groups
//!
//! All values are little endian. Strings are UTF-8 with a 7-bit encoded
//! length prefix. A node without a parent is stored with parent index -1.
//!
//! Hierarchy: node count as `i32`, then name, index and parent index for each
//! node.
//!
//! Pose group: hierarchy pose count as `i32`, then rotate, scale, translate
//! and user as four `f32` each for every pose in pool order, then the channel
//! and then the Euler order of each node as `i32`. The node count is not
//! stored, it comes from the hierarchy the group is loaded against.
use crate::{
    arm_error::ArmError,
    hierarchy::{Hierarchy, HierarchyNode},
    pose::HierarchyPoseGroup,
    spatial_pose::{EulerOrder, PoseChannel, SpatialPose},
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;
use nalgebra_glm as glm;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    sync::Arc,
};

// A u32 length never needs more than 5 groups of 7 bits
const MAX_LENGTH_BYTES: usize = 5;

fn write_count<W: Write>(writer: &mut W, count: usize) -> Result<(), ArmError> {
    let count = i32::try_from(count).map_err(|_| ArmError::InvalidCount(count))?;
    writer.write_i32::<LittleEndian>(count)?;
    Ok(())
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize, ArmError> {
    let count = reader.read_i32::<LittleEndian>()?;
    match usize::try_from(count) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ArmError::InvalidFile),
    }
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<(), ArmError> {
    let mut len = u32::try_from(s.len()).map_err(|_| ArmError::InvalidCount(s.len()))?;
    while len >= 0x80 {
        writer.write_u8((len as u8 & 0x7F) | 0x80)?;
        len >>= 7;
    }
    writer.write_u8(len as u8)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, ArmError> {
    let mut len = 0_u64;
    let mut complete = false;
    for i in 0..MAX_LENGTH_BYTES {
        let byte = reader.read_u8()?;
        len |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            complete = true;
            break;
        }
    }
    if !complete {
        return Err(ArmError::InvalidFile);
    }
    // Grows with the data actually present rather than the stated length
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(ArmError::FileTooShort);
    }
    String::from_utf8(bytes).map_err(|_| ArmError::InvalidFile)
}

fn write_vec4<W: Write>(writer: &mut W, v: &glm::Vec4) -> Result<(), ArmError> {
    for c in v.iter() {
        writer.write_f32::<LittleEndian>(*c)?;
    }
    Ok(())
}

fn read_vec4<R: Read>(reader: &mut R) -> Result<glm::Vec4, ArmError> {
    let x = reader.read_f32::<LittleEndian>()?;
    let y = reader.read_f32::<LittleEndian>()?;
    let z = reader.read_f32::<LittleEndian>()?;
    let w = reader.read_f32::<LittleEndian>()?;
    Ok(glm::vec4(x, y, z, w))
}

/// # Errors
/// Returns an error if writing fails
pub fn write_hierarchy<W: Write>(
    writer: &mut W,
    hierarchy: &Hierarchy,
) -> Result<usize, ArmError> {
    write_count(writer, hierarchy.num_nodes())?;
    for node in hierarchy.nodes() {
        write_string(writer, &node.name)?;
        write_count(writer, node.index)?;
        let parent = match node.parent_index {
            Some(p) => i32::try_from(p).map_err(|_| ArmError::IndexOutOfRange(p))?,
            None => -1,
        };
        writer.write_i32::<LittleEndian>(parent)?;
    }
    Ok(hierarchy.num_nodes())
}

/// # Errors
/// Returns an error if reading fails or the data does not describe a valid
/// hierarchy
pub fn read_hierarchy<R: Read>(reader: &mut R) -> Result<Hierarchy, ArmError> {
    let count = read_count(reader)?;
    let mut nodes = Vec::new();
    for _ in 0..count {
        let name = read_string(reader)?;
        let index = reader.read_i32::<LittleEndian>()?;
        let index = usize::try_from(index).map_err(|_| ArmError::InvalidFile)?;
        let parent = reader.read_i32::<LittleEndian>()?;
        let parent_index = match parent {
            -1 => None,
            p => Some(usize::try_from(p).map_err(|_| ArmError::InvalidFile)?),
        };
        nodes.push(HierarchyNode {
            name,
            index,
            parent_index,
        });
    }
    Hierarchy::from_nodes(nodes)
}

/// # Errors
/// Returns an error if the group is uninitialized or writing fails
pub fn write_pose_group<W: Write>(
    writer: &mut W,
    group: &HierarchyPoseGroup,
) -> Result<usize, ArmError> {
    if !group.is_initialized() {
        return Err(ArmError::NotInitialized);
    }
    write_count(writer, group.hpose_count())?;
    for pose in group.poses() {
        write_vec4(writer, &pose.rotate)?;
        write_vec4(writer, &pose.scale)?;
        write_vec4(writer, &pose.translate)?;
        write_vec4(writer, &pose.user)?;
    }
    for channel in group.channels() {
        writer.write_i32::<LittleEndian>(i32::from(channel.bits()))?;
    }
    for order in group.orders() {
        writer.write_i32::<LittleEndian>(order.to_i32())?;
    }
    Ok(group.pose_count())
}

/// Reads a pose group made for `hierarchy`. The group is only allocated once
/// every pose record has been read.
///
/// # Errors
/// Returns an error if reading fails or a channel or order is unknown
pub fn read_pose_group<R: Read>(
    reader: &mut R,
    hierarchy: &Arc<Hierarchy>,
) -> Result<HierarchyPoseGroup, ArmError> {
    let hpose_count = read_count(reader)?;
    let node_count = hierarchy.num_nodes();
    let pose_count = hpose_count
        .checked_mul(node_count)
        .ok_or(ArmError::InvalidFile)?;
    let mut poses = Vec::new();
    for _ in 0..pose_count {
        poses.push(SpatialPose {
            rotate: read_vec4(reader)?,
            scale: read_vec4(reader)?,
            translate: read_vec4(reader)?,
            user: read_vec4(reader)?,
            ..SpatialPose::identity()
        });
    }
    let mut channels = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let bits = reader.read_i32::<LittleEndian>()?;
        let channel = u16::try_from(bits)
            .ok()
            .and_then(PoseChannel::from_bits)
            .ok_or(ArmError::InvalidFile)?;
        channels.push(channel);
    }
    let mut orders = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let value = reader.read_i32::<LittleEndian>()?;
        orders.push(EulerOrder::from_i32(value).ok_or(ArmError::InvalidFile)?);
    }
    let mut group = HierarchyPoseGroup::new(hierarchy, hpose_count)?;
    group.poses_mut().copy_from_slice(&poses);
    group.set_channels_and_orders(channels, orders)?;
    Ok(group)
}

/// # Errors
/// Returns an error if the file can't be created or writing fails
pub fn save_hierarchy(
    path: &Path,
    hierarchy: &Hierarchy,
) -> Result<usize, ArmError> {
    info!("Saving hierarchy {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_hierarchy(&mut writer, hierarchy)?;
    writer.flush()?;
    Ok(count)
}

/// # Errors
/// Returns an error if the file can't be opened or is not a valid hierarchy
pub fn load_hierarchy(path: &Path) -> Result<Hierarchy, ArmError> {
    info!("Loading hierarchy {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    read_hierarchy(&mut reader)
}

/// # Errors
/// Returns an error if the group is uninitialized, the file can't be created
/// or writing fails
pub fn save_pose_group(
    path: &Path,
    group: &HierarchyPoseGroup,
) -> Result<usize, ArmError> {
    info!("Saving pose group {}", path.display());
    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_pose_group(&mut writer, group)?;
    writer.flush()?;
    Ok(count)
}

/// # Errors
/// Returns an error if the file can't be opened or is not a valid pose group
/// for `hierarchy`
pub fn load_pose_group(
    path: &Path,
    hierarchy: &Arc<Hierarchy>,
) -> Result<HierarchyPoseGroup, ArmError> {
    info!("Loading pose group {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    read_pose_group(&mut reader, hierarchy)
}
