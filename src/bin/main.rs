//! Surface Camera CLI
//!
//! Inspect a scene fixture and run the camera placement chain against it.

use clap::{Args, Parser, Subcommand};
use surface_camera::{
    load_scene, MemoryScene, SelectionState, SurfaceCamera, SurfaceCameraConfig, TransformHost,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "surface-camera")]
#[command(author, version, about = "Place a render-to-texture camera on a mesh surface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SceneArgs {
    /// Scene fixture (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Configuration overrides (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate objects
    Objects {
        #[command(flatten)]
        scene: SceneArgs,
    },

    /// List the material slots of an object
    Materials {
        #[command(flatten)]
        scene: SceneArgs,

        /// Object key (e.g., "[0]Body.menu")
        #[arg(short, long)]
        object: String,
    },

    /// List the face normal clusters of a material slot
    Normals {
        #[command(flatten)]
        scene: SceneArgs,

        /// Object key
        #[arg(short, long)]
        object: String,

        /// Material slot key (e.g., "[0-1]Skin")
        #[arg(short, long)]
        material: String,
    },

    /// Place a camera rig and bind it to a display material
    Rig {
        #[command(flatten)]
        scene: SceneArgs,

        /// Camera object key
        #[arg(short, long)]
        object: String,

        /// Camera material slot key
        #[arg(short, long)]
        material: String,

        /// Normal key (e.g., "0.00-0.00-1.00")
        #[arg(short, long, allow_hyphen_values = true)]
        normal: String,

        /// Display object key
        #[arg(long)]
        display_object: String,

        /// Display material slot key
        #[arg(long)]
        display_material: String,

        /// Roll about the view axis, in degrees
        #[arg(long, allow_hyphen_values = true)]
        roll: Option<f32>,

        /// Field of view, in degrees
        #[arg(long)]
        fov: Option<f32>,

        /// Render one frame and write the target to this PNG
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Objects { scene } => {
            let (scene, mut camera, mut state) = open(&scene)?;
            let objects = camera.search_objects(&scene, &mut state);
            println!("Found {} candidate objects", objects.len());
            for key in objects.keys() {
                println!("  {}", key);
            }
        }
        Commands::Materials { scene, object } => {
            let (scene, mut camera, mut state) = open(&scene)?;
            camera.search_objects(&scene, &mut state);
            let slots = camera.on_object_chosen(&scene, &mut state, &object)?;
            println!("{}: {} material slots", object, slots.len());
            for key in slots.keys() {
                println!("  {}", key);
            }
        }
        Commands::Normals {
            scene,
            object,
            material,
        } => {
            let (scene, mut camera, mut state) = open(&scene)?;
            camera.search_objects(&scene, &mut state);
            camera.on_object_chosen(&scene, &mut state, &object)?;
            let normals = camera.on_material_chosen(&scene, &mut state, &material)?;
            println!("{}: {} normal clusters", material, normals.len());
            for key in normals.keys() {
                println!("  {}", key);
            }
        }
        Commands::Rig {
            scene,
            object,
            material,
            normal,
            display_object,
            display_material,
            roll,
            fov,
            output,
        } => {
            let (mut scene, mut camera, mut state) = open(&scene)?;
            camera.search_objects(&scene, &mut state);
            camera.on_object_chosen(&scene, &mut state, &object)?;
            camera.on_material_chosen(&scene, &mut state, &material)?;
            camera.on_normal_chosen(&mut state, &normal)?;
            camera.on_display_object_chosen(&scene, &mut state, &display_object)?;
            camera.on_display_chosen(&mut state, &display_material)?;
            if let Some(roll) = roll {
                camera.set_roll(&mut state, roll);
            }
            if let Some(fov) = fov {
                camera.set_fov(&mut state, fov);
            }

            let target = camera.apply(&mut scene, &state)?;
            print_rig(&scene, &camera)?;

            if let Some(path) = output {
                scene.end_frame();
                match scene.render_target(target) {
                    Some(rt) => {
                        rt.color.save(&path)?;
                        println!("Wrote {}x{} target to {:?}", rt.width(), rt.height(), path);
                    }
                    None => eprintln!("Render target {:?} is gone", target),
                }
            }
        }
    }

    Ok(())
}

fn open(args: &SceneArgs) -> Result<(MemoryScene, SurfaceCamera, SelectionState), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => SurfaceCameraConfig::from_json_file(path)?,
        None => SurfaceCameraConfig::default(),
    };
    let scene = load_scene(&args.scene)?;
    let camera = SurfaceCamera::new(config);
    let state = camera.new_state();
    Ok((scene, camera, state))
}

fn print_rig(scene: &MemoryScene, camera: &SurfaceCamera) -> Result<(), Box<dyn std::error::Error>> {
    let Some(rig) = camera.rig() else {
        println!("No camera rig placed");
        return Ok(());
    };

    let local = scene.local_transform(rig.anchor)?;
    let binding = rig.binding().map(|b| {
        serde_json::json!({
            "material": b.material,
            "previous_texture": b.previous_texture,
            "target": b.target,
            "target_size": [b.target_size.0, b.target_size.1],
            "uv_min": b.uv_bounds.min.to_array(),
            "uv_max": b.uv_bounds.max.to_array(),
            "camera": b.camera,
        })
    });

    let summary = serde_json::json!({
        "anchor": rig.anchor,
        "parent": rig.parent,
        "normal": rig.placement.source.key.to_string(),
        "bounds_min": rig.placement.bounds.min.to_array(),
        "bounds_max": rig.placement.bounds.max.to_array(),
        "local_position": local.position.to_array(),
        "local_scale": local.scale.to_array(),
        "forward": rig.placement.forward.to_array(),
        "roll": rig.placement.roll,
        "world_rotation": scene.world_rotation(rig.anchor)?.to_array(),
        "binding": binding,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
