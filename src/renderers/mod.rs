pub mod charts;
pub mod hierarchy;
pub mod maps;
pub mod plotly;
pub mod static_map;

pub use hierarchy::Hierarchy;
pub use maps::MapMetric;
pub use plotly::PlotlyFigure;

use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::SolarAnalysis;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Report figures and the file each one is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Figure {
    SystemSizeScatter,
    Treemap,
    CumulativeMap,
    Sunburst,
    MeanMap,
    CapacityArea,
    CountMap,
    TechnologyBar,
    RegionBox,
    TiltPolar,
    LogMap,
}

impl Figure {
    pub const ALL: [Figure; 11] = [
        Figure::SystemSizeScatter,
        Figure::Treemap,
        Figure::CumulativeMap,
        Figure::Sunburst,
        Figure::MeanMap,
        Figure::CapacityArea,
        Figure::CountMap,
        Figure::TechnologyBar,
        Figure::RegionBox,
        Figure::TiltPolar,
        Figure::LogMap,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Figure::SystemSizeScatter => "system_size_scatter.html",
            Figure::Treemap => "treemap.html",
            Figure::CumulativeMap => "cumulative_map.html",
            Figure::Sunburst => "sunburst.html",
            Figure::MeanMap => "mean_map.html",
            Figure::CapacityArea => "cumulative_installations.html",
            Figure::CountMap => "count_map.html",
            Figure::TechnologyBar => "bar_animated.html",
            Figure::RegionBox => "boxplot.html",
            Figure::TiltPolar => "tilt.html",
            Figure::LogMap => "map_log.png",
        }
    }

    /// Part of the standard report
    pub fn is_default(&self) -> bool {
        matches!(
            self,
            Figure::SystemSizeScatter
                | Figure::Treemap
                | Figure::CumulativeMap
                | Figure::Sunburst
                | Figure::MeanMap
                | Figure::CapacityArea
        )
    }

    pub fn defaults() -> Vec<Figure> {
        Self::ALL.into_iter().filter(Figure::is_default).collect()
    }
}

/// Writes figures for one analysis into an output directory
pub struct ReportRenderer<'a> {
    analysis: &'a SolarAnalysis,
    config: &'a AnalysisConfig,
    output_dir: PathBuf,
    max_workers: usize,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(analysis: &'a SolarAnalysis, config: &'a AnalysisConfig, output_dir: &Path) -> Self {
        Self {
            analysis,
            config,
            output_dir: output_dir.to_path_buf(),
            max_workers: num_cpus::get(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Render `figures` in parallel and return the written paths in request order
    pub fn render(&self, figures: &[Figure], progress: &ProgressReporter) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut unique: Vec<Figure> = Vec::with_capacity(figures.len());
        for figure in figures {
            if !unique.contains(figure) {
                unique.push(*figure);
            }
        }
        let figures = unique;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let paths: Result<Vec<PathBuf>> = pool.install(|| {
            figures
                .par_iter()
                .map(|figure| {
                    let result = self.render_figure(*figure);
                    progress.increment(1);
                    result
                })
                .collect()
        });
        let paths = paths?;

        tracing::info!(
            dir = %self.output_dir.display(),
            figures = paths.len(),
            "rendered figures"
        );
        Ok(paths)
    }

    pub fn render_figure(&self, figure: Figure) -> Result<PathBuf> {
        let path = self.output_dir.join(figure.file_name());
        let analysis = self.analysis;

        let plotly = match figure {
            Figure::LogMap => {
                static_map::render_log_map(&analysis.boundary, &analysis.area_summaries, &path)?;
                return Ok(path);
            }
            Figure::SystemSizeScatter => charts::system_size_scatter(&analysis.records, self.config),
            Figure::Treemap => charts::treemap(&analysis.records, self.config),
            Figure::Sunburst => charts::sunburst(&analysis.records, self.config),
            Figure::CapacityArea => charts::capacity_area(&analysis.area_series),
            Figure::TechnologyBar => charts::technology_bar(&analysis.technology_series),
            Figure::RegionBox => charts::region_box(&analysis.records),
            Figure::TiltPolar => charts::tilt_polar(&analysis.records),
            Figure::CumulativeMap => maps::choropleth(
                &analysis.boundary,
                &analysis.area_summaries,
                MapMetric::CumulativeCapacity,
            ),
            Figure::MeanMap => maps::choropleth(
                &analysis.boundary,
                &analysis.area_summaries,
                MapMetric::MeanSystemSize,
            ),
            Figure::CountMap => maps::choropleth(
                &analysis.boundary,
                &analysis.area_summaries,
                MapMetric::SystemCount,
            ),
        };

        plotly.write_html(&path)?;
        tracing::debug!(figure = ?figure, path = %path.display(), "wrote figure");
        Ok(path)
    }
}
