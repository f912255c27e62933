//! Behaviour-driven tests for identifier normalisation.
//!
//! Scenarios cover the collapsing package-name rule, both version passes, and
//! the architecture table. Tests use the rstest-bdd v0.5.0 mutable world
//! pattern.

use omnibus_docker_common::{
    Normalised, PlatformInfo, VersionNormalisation, normalise_package_name, normalise_version,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

#[derive(Default)]
struct NormalisationWorld {
    raw_name: Option<String>,
    raw_version: Option<String>,
    platform: Option<PlatformInfo>,
    name: Option<Normalised>,
    version: Option<VersionNormalisation>,
    architecture: Option<String>,
}

impl NormalisationWorld {
    fn normalised_value(&self) -> &str {
        match (&self.name, &self.version) {
            (Some(name), _) => name.value(),
            (None, Some(version)) => version.value(),
            (None, None) => panic!("nothing was normalised"),
        }
    }

    fn was_modified(&self) -> bool {
        match (&self.name, &self.version) {
            (Some(name), _) => name.was_modified(),
            (None, Some(version)) => version.was_modified(),
            (None, None) => panic!("nothing was normalised"),
        }
    }

    fn modified_version_passes(&self) -> usize {
        self.version
            .as_ref()
            .expect("version normalised")
            .passes()
            .filter(|pass| pass.was_modified())
            .count()
    }
}

#[fixture]
fn world() -> NormalisationWorld {
    NormalisationWorld::default()
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a raw package name \"{raw}\"")]
fn given_raw_name(world: &mut NormalisationWorld, raw: String) {
    world.raw_name = Some(raw);
}

#[given("a raw version \"{raw}\"")]
fn given_raw_version(world: &mut NormalisationWorld, raw: String) {
    world.raw_version = Some(raw);
}

#[given("a host machine \"{machine}\" on platform \"{platform}\"")]
fn given_host(world: &mut NormalisationWorld, machine: String, platform: String) {
    world.platform = Some(PlatformInfo::new(machine, platform));
}

#[when("the package name is normalised")]
fn when_name_normalised(world: &mut NormalisationWorld) {
    let raw = world.raw_name.as_deref().expect("raw name set");
    world.name = Some(normalise_package_name(raw));
}

#[when("the version is normalised")]
fn when_version_normalised(world: &mut NormalisationWorld) {
    let raw = world.raw_version.as_deref().expect("raw version set");
    world.version = Some(normalise_version(raw));
}

#[when("the architecture is resolved")]
fn when_architecture_resolved(world: &mut NormalisationWorld) {
    let platform = world.platform.as_ref().expect("platform set");
    world.architecture = Some(platform.architecture().to_string());
}

#[then("the normalised value is \"{expected}\"")]
fn then_value(world: &mut NormalisationWorld, expected: String) {
    assert_eq!(world.normalised_value(), expected);
}

#[then("the value is reported as modified")]
fn then_modified(world: &mut NormalisationWorld) {
    assert!(world.was_modified(), "expected a modification flag");
}

#[then("the value is reported as unmodified")]
fn then_unmodified(world: &mut NormalisationWorld) {
    assert!(!world.was_modified(), "expected no modification flag");
}

#[then("the dash pass produces \"{expected}\"")]
fn then_dash_pass(world: &mut NormalisationWorld, expected: String) {
    let version = world.version.as_ref().expect("version normalised");
    assert_eq!(version.dash().value(), expected);
}

#[then("{count} version pass is reported as modified")]
fn then_one_pass_modified(world: &mut NormalisationWorld, count: usize) {
    assert_eq!(world.modified_version_passes(), count);
}

#[then("{count} version passes are reported as modified")]
fn then_passes_modified(world: &mut NormalisationWorld, count: usize) {
    assert_eq!(world.modified_version_passes(), count);
}

#[then("the architecture is \"{expected}\"")]
fn then_architecture(world: &mut NormalisationWorld, expected: String) {
    assert_eq!(world.architecture.as_deref(), Some(expected.as_str()));
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Package name with uppercase and punctuation is collapsed"
)]
fn scenario_collapse_package_name(world: NormalisationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Valid package name is untouched"
)]
fn scenario_valid_package_name(world: NormalisationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Pre-release dash becomes a tilde"
)]
fn scenario_dash_to_tilde(world: NormalisationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Version with spaces and dashes fires both passes"
)]
fn scenario_both_version_passes(world: NormalisationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Raspbian ARMv6 maps to armhf"
)]
fn scenario_raspbian_armhf(world: NormalisationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/normalisation.feature",
    name = "Unknown machine passes through"
)]
fn scenario_unknown_machine(world: NormalisationWorld) {
    let _ = world;
}
