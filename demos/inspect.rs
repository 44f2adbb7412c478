//! Small CLI that prints summary counts for a PMX or VMD file, dispatched
//! on file extension. Not part of the public API.

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("usage: mmd-inspect <path.pmx|path.vmd>");
            return ExitCode::FAILURE;
        }
    };

    let lower = path.to_lowercase();
    let result = if lower.ends_with(".vmd") {
        inspect_vmd(&path)
    } else {
        inspect_pmx(&path)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{path}: {err}");
            ExitCode::FAILURE
        }
    }
}

fn inspect_pmx(path: &str) -> Result<(), mmd_codec::Error> {
    log::info!("loading PMX model from {path}");
    let model = mmd_codec::load_pmx(path)?;
    println!("model: {}", model.model_info.name);
    println!("vertices: {}", model.vertices.len());
    println!("faces: {}", model.faces.len());
    println!("materials: {}", model.materials.len());
    println!("bones: {}", model.bones.len());
    println!("morphs: {}", model.morphs.len());
    println!("rigid bodies: {}", model.rigid_bodies.len());
    println!("joints: {}", model.joints.len());
    Ok(())
}

fn inspect_vmd(path: &str) -> Result<(), mmd_codec::Error> {
    log::info!("loading VMD motion from {path}");
    let motion = mmd_codec::load_vmd(path)?;
    println!("model: {}", motion.model_name);
    println!("motion tracks: {}", motion.motion_tracks.len());
    println!("morph tracks: {}", motion.morph_tracks.len());
    println!("camera keys: {}", motion.camera_track.len());
    println!("light keys: {}", motion.light_track.len());
    println!("shadow keys: {}", motion.shadow_track.len());
    println!("visibility keys: {}", motion.visibility_track.len());
    println!("ik tracks: {}", motion.ik_tracks.len());
    Ok(())
}
