mod plan;
mod regions;
mod report;
mod routing;
mod scenario;
mod sweep;
