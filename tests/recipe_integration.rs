//! Recipe Integration Tests
//!
//! Exercises the library end-to-end: loading cookbooks from disk and
//! running them with the real shell and template engine. Package installs
//! go through a recording stand-in so no packages touch the test host.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use cookrun::{
    load_recipe, MinijinjaEngine, PackageManager, Runner, RunnerState, StepError, SystemShell,
    RECIPE_FILE,
};
use tempfile::TempDir;

/// Package manager that records installs instead of running apt.
struct RecordingPackages {
    installed: Rc<RefCell<Vec<String>>>,
}

impl PackageManager for RecordingPackages {
    fn install(&self, package: &str) -> anyhow::Result<()> {
        self.installed.borrow_mut().push(package.to_string());
        Ok(())
    }
}

fn runner_with_recording_packages() -> (Runner, Rc<RefCell<Vec<String>>>) {
    let installed = Rc::new(RefCell::new(Vec::new()));
    let runner = Runner::with_collaborators(
        Box::new(RecordingPackages { installed: Rc::clone(&installed) }),
        Box::new(SystemShell::new()),
        Box::new(MinijinjaEngine::new()),
    );
    (runner, installed)
}

fn write_cookbook(dir: &Path, name: &str, yaml: &str) {
    let cookbook = dir.join(name);
    fs::create_dir_all(&cookbook).unwrap();
    fs::write(cookbook.join(RECIPE_FILE), yaml).unwrap();
}

#[test]
fn test_provision_scripts_and_templates_end_to_end() {
    let temp = TempDir::new().unwrap();
    let cookbooks = temp.path().join("cookbooks");

    write_cookbook(
        &cookbooks,
        "service",
        r#"
name: service
description: Minimal service layout
defaults:
  cluster_name: Test Cluster
steps:
  - script:
      name: make_conf_dir
      cwd: "{{ install_dir }}"
      body: mkdir -p service/conf

  - template:
      name: service.yaml
      source: service.yaml.tmpl
      path: "{{ install_dir }}/service/conf/service.yaml"

  - script:
      name: seal_conf
      cwd: "{{ install_dir }}"
      body: chmod -R ug+rwX service
"#,
    );
    let templates = cookbooks.join("service").join("templates");
    fs::create_dir_all(&templates).unwrap();
    fs::write(
        templates.join("service.yaml.tmpl"),
        "cluster_name: '{{ cluster_name }}'\nowned_by: {{ owner }}\n",
    )
    .unwrap();

    let recipe =
        load_recipe(&cookbooks.join("service").join(RECIPE_FILE), Some(&cookbooks)).unwrap();

    let (mut runner, _installed) = runner_with_recording_packages();
    runner.set_variable("install_dir", temp.path().display().to_string());
    runner.set_variable("owner", "cassandra");
    runner.run(&recipe).unwrap();

    assert_eq!(*runner.state(), RunnerState::Completed);
    assert_eq!(runner.results().len(), 3);
    assert!(runner.results().iter().all(|r| r.success));

    let rendered = fs::read_to_string(temp.path().join("service/conf/service.yaml")).unwrap();
    assert!(rendered.contains("cluster_name: 'Test Cluster'"));
    assert!(rendered.contains("owned_by: cassandra"));
}

#[test]
fn test_package_steps_install_in_declaration_order() {
    let temp = TempDir::new().unwrap();
    let cookbooks = temp.path().join("cookbooks");

    write_cookbook(
        &cookbooks,
        "devtools",
        r#"
name: devtools
steps:
  - package: build-essential
  - package: curl
  - package: vim
  - package: git-core
"#,
    );

    let recipe =
        load_recipe(&cookbooks.join("devtools").join(RECIPE_FILE), Some(&cookbooks)).unwrap();

    let (mut runner, installed) = runner_with_recording_packages();
    runner.run(&recipe).unwrap();

    assert_eq!(*installed.borrow(), vec!["build-essential", "curl", "vim", "git-core"]);
}

#[test]
fn test_include_provisions_base_before_site() {
    let temp = TempDir::new().unwrap();
    let cookbooks = temp.path().join("cookbooks");

    write_cookbook(
        &cookbooks,
        "base",
        r#"
name: base
defaults:
  marker_name: base.txt
steps:
  - script:
      name: base_marker
      cwd: "{{ work_dir }}"
      body: echo base >> order.txt
"#,
    );
    write_cookbook(
        &cookbooks,
        "site",
        r#"
name: site
steps:
  - include: base
  - script:
      name: site_marker
      cwd: "{{ work_dir }}"
      body: echo site >> order.txt
"#,
    );

    let recipe = load_recipe(&cookbooks.join("site").join(RECIPE_FILE), Some(&cookbooks)).unwrap();

    let (mut runner, _installed) = runner_with_recording_packages();
    runner.set_variable("work_dir", temp.path().display().to_string());
    runner.run(&recipe).unwrap();

    let order = fs::read_to_string(temp.path().join("order.txt")).unwrap();
    assert_eq!(order, "base\nsite\n");

    // Defaults from the included cookbook came along
    assert_eq!(recipe.defaults.get("marker_name"), Some(&"base.txt".to_string()));
}

#[test]
fn test_failing_script_stops_provisioning() {
    let temp = TempDir::new().unwrap();
    let cookbooks = temp.path().join("cookbooks");

    write_cookbook(
        &cookbooks,
        "flaky",
        r#"
name: flaky
steps:
  - script:
      name: breaks
      body: exit 7
  - script:
      name: never_runs
      cwd: "{{ work_dir }}"
      body: touch after.txt
"#,
    );

    let recipe = load_recipe(&cookbooks.join("flaky").join(RECIPE_FILE), Some(&cookbooks)).unwrap();

    let (mut runner, _installed) = runner_with_recording_packages();
    runner.set_variable("work_dir", temp.path().display().to_string());
    let err = runner.run(&recipe).unwrap_err();

    let StepError::ScriptExecution { script, exit_code, .. } = err else {
        panic!("expected a script failure");
    };
    assert_eq!(script, "breaks");
    assert_eq!(exit_code, Some(7));

    assert!(matches!(runner.state(), RunnerState::Failed(_)));
    assert!(!temp.path().join("after.txt").exists());
}

#[test]
fn test_shipped_vagrant_cookbook_resolves() {
    let cookbooks = Path::new(env!("CARGO_MANIFEST_DIR")).join("cookbooks");

    let recipe =
        load_recipe(&cookbooks.join("vagrant").join(RECIPE_FILE), Some(&cookbooks)).unwrap();

    // apt splices in first, cassandra last; every step resolved
    assert_eq!(recipe.step_count(), 13);
    assert_eq!(recipe.steps[0].name(), "apt_update");
    assert_eq!(recipe.steps.last().unwrap().name(), "start_cassandra");

    // Template sources point into the cassandra cookbook
    let template_step = recipe
        .steps
        .iter()
        .find(|s| s.name() == "cassandra.yaml")
        .expect("cassandra.yaml template step");
    assert_eq!(template_step.kind(), "template");
}
