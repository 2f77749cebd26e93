use ffbatch::engine::{
    DurationProbe, EncodePlan, EncodeRequest, FixedDuration, Result, Settings, assemble,
};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Assemble a plan for fixed paths, a nil job id and a 60 second source
pub fn plan(request: &EncodeRequest) -> Result<EncodePlan> {
    plan_with(request, &FixedDuration(60.0), &Settings::default())
}

pub fn plan_with(
    request: &EncodeRequest,
    probe: &dyn DurationProbe,
    settings: &Settings,
) -> Result<EncodePlan> {
    assemble(
        request,
        Path::new("/tmp/input.mov"),
        Path::new("/tmp/output.out"),
        Uuid::nil(),
        probe,
        settings,
    )
}

/// Every pass joined with spaces
pub fn joined(plan: &EncodePlan) -> Vec<String> {
    plan.passes.iter().map(|p| p.join(" ")).collect()
}

/// Create empty-ish input files named `names` inside `dir`
pub fn make_inputs(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::write(&path, b"fake media").unwrap();
            path
        })
        .collect()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
