use std::fs;
use std::path::{Path, PathBuf};

fn shader_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("src/render/shaders")
        .join(name)
}

fn validate_shader(name: &str) -> naga::Module {
    let path = shader_path(name);
    let src = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => panic!("Failed to read shader file {path:?}: {e}"),
    };

    let module = match naga::front::wgsl::parse_str(&src) {
        Ok(m) => m,
        Err(e) => panic!(
            "WGSL parsing error in {path:?}:\n{error_report}",
            error_report = e.emit_to_string(&src)
        ),
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    if let Err(e) = validator.validate(&module) {
        panic!(
            "WGSL validation error in {path:?}:\n{error_report}",
            error_report = e.emit_to_string(&src)
        );
    }
    module
}

fn assert_stages(module: &naga::Module) {
    let stage_of = |name: &str| {
        module
            .entry_points
            .iter()
            .find(|ep| ep.name == name)
            .map(|ep| ep.stage)
    };
    assert_eq!(stage_of("vs_main"), Some(naga::ShaderStage::Vertex));
    assert_eq!(stage_of("fs_main"), Some(naga::ShaderStage::Fragment));
}

#[test]
fn capture_shader_compiles() {
    let module = validate_shader("capture.wgsl");
    assert_stages(&module);

    // Two uniform blocks: face views and lighting.
    let uniforms = module
        .global_variables
        .iter()
        .filter(|(_, g)| g.space == naga::AddressSpace::Uniform)
        .count();
    assert_eq!(uniforms, 2);
}

#[test]
fn equirect_shader_compiles() {
    let module = validate_shader("equirect.wgsl");
    assert_stages(&module);
}

#[test]
fn preview_shader_compiles() {
    let module = validate_shader("preview.wgsl");
    assert_stages(&module);
}

#[test]
fn capture_face_index_is_unsigned_view_index() {
    let module = validate_shader("capture.wgsl");
    let Some(vs) = module.entry_points.iter().find(|ep| ep.name == "vs_main") else {
        panic!("capture.wgsl has no vs_main");
    };

    let face = vs
        .function
        .arguments
        .iter()
        .find(|arg| arg.binding == Some(naga::Binding::BuiltIn(naga::BuiltIn::ViewIndex)));
    let Some(face) = face else {
        panic!("vs_main does not take @builtin(view_index)");
    };
    assert_eq!(
        module.types[face.ty].inner,
        naga::TypeInner::Scalar(naga::Scalar::U32)
    );
}
