//! Provisioning driver: install then build every declared dependency, in order.
//!
//! The run is fail-fast. The first error stops it and names the dependency and
//! the step; dependencies completed earlier in the run are left in place.

use crate::adapter::BuildContext;
use crate::config::Layout;
use crate::dependency::{DependencySpec, validate_all};
use crate::descriptor::AggregateDescriptor;
use crate::fetch::{InstallStatus, SourceFetcher};
use crate::native::BuildTool;
use crate::staging::Staging;
use crate::vcs::SourceControl;
use anyhow::{Context, Result};
use colored::*;

/// Outcome for one dependency of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub revision: String,
    pub status: InstallStatus,
    pub strategy: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn cache_hits(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == InstallStatus::CacheHit)
            .count()
    }
}

pub struct Provisioner<'a> {
    layout: Layout,
    source_control: &'a dyn SourceControl,
    build_tool: &'a dyn BuildTool,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        layout: Layout,
        source_control: &'a dyn SourceControl,
        build_tool: &'a dyn BuildTool,
    ) -> Self {
        Self {
            layout,
            source_control,
            build_tool,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn run(&self, dependencies: &[DependencySpec]) -> Result<RunReport> {
        validate_all(dependencies)?;

        let descriptor = AggregateDescriptor::new(&self.layout.descriptor);
        descriptor.reset()?;
        let staging = Staging::new(&self.layout.include_root, &self.layout.lib_root);
        let fetcher = SourceFetcher::new(&self.layout.install_root, self.source_control);

        let mut report = RunReport::default();
        for spec in dependencies {
            println!("{} Installing {}...", "📦".blue(), spec.name.bold());
            let record = fetcher
                .install(spec)
                .with_context(|| format!("Failed to install '{}'", spec.name))?;

            println!("{} Building {}...", "🔨".yellow(), spec.name.bold());
            let context = BuildContext {
                spec,
                record: &record,
                staging: &staging,
                descriptor: &descriptor,
                tool: self.build_tool,
            };
            spec.strategy
                .build(&context)
                .with_context(|| format!("Failed to build '{}'", spec.name))?;

            report.entries.push(ReportEntry {
                name: spec.name.clone(),
                revision: record.revision,
                status: record.status,
                strategy: spec.strategy.label().to_string(),
            });
        }

        Ok(report)
    }
}
