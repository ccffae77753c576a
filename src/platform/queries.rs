//! GraphQL documents sent to the projects API

pub const PROJECTS: &str = r#"
query projects {
  projects {
    id
    name
  }
}
"#;

pub const JOBS: &str = r#"
query jobs($projectId: UUID!) {
  jobs(projectId: $projectId) {
    id
    name
  }
}
"#;

pub const JOB_BY_ALIAS: &str = r#"
query jobByAlias($projectId: UUID!, $alias: String!) {
  jobByAlias(projectId: $projectId, alias: $alias) {
    id
    name
  }
}
"#;

pub const REPOSITORIES: &str = r#"
query repositories {
  repositories {
    id
    name
    technologies {
      id
      label
    }
  }
}
"#;

pub const CREATE_JOB: &str = r#"
mutation createJob($job: JobInput!, $jobVersion: JobVersionInput!, $file: Upload) {
  createJob(job: $job, jobVersion: $jobVersion, file: $file) {
    id
    versions {
      number
    }
  }
}
"#;

pub const ADD_JOB_VERSION: &str = r#"
mutation addJobVersion($jobId: UUID!, $jobVersion: JobVersionInput!, $file: Upload) {
  addJobVersion(jobId: $jobId, jobVersion: $jobVersion, file: $file) {
    number
  }
}
"#;

pub const EDIT_JOB: &str = r#"
mutation editJob($job: JobEditionInput!) {
  editJob(job: $job) {
    id
  }
}
"#;

pub const RUN_JOB: &str = r#"
mutation runJob($jobId: UUID!) {
  runJob(jobId: $jobId) {
    id
    status
  }
}
"#;

pub const JOB_INSTANCE: &str = r#"
query jobInstance($id: UUID!) {
  jobInstance(id: $id) {
    id
    status
    startTime
    endTime
  }
}
"#;

pub const PIPELINES: &str = r#"
query pipelines($projectId: UUID!) {
  project(id: $projectId) {
    pipelines {
      id
      name
    }
  }
}
"#;

pub const CREATE_GRAPH_PIPELINE: &str = r#"
mutation createGraphPipeline($pipeline: GraphPipelineInput!) {
  createGraphPipeline(pipeline: $pipeline) {
    id
    versions {
      number
    }
  }
}
"#;

pub const ADD_GRAPH_PIPELINE_VERSION: &str = r#"
mutation addGraphPipelineVersion($pipelineId: UUID!, $graph: PipelineGraphInput!, $releaseNote: String, $sourceUrl: String) {
  addGraphPipelineVersion(pipelineId: $pipelineId, graph: $graph, releaseNote: $releaseNote, sourceUrl: $sourceUrl) {
    number
  }
}
"#;

pub const EDIT_PIPELINE: &str = r#"
mutation editPipeline($pipeline: PipelineEditionInput!) {
  editPipeline(pipeline: $pipeline) {
    id
  }
}
"#;

pub const RUN_PIPELINE: &str = r#"
mutation runPipeline($pipelineId: UUID!) {
  runPipeline(pipelineId: $pipelineId) {
    id
    status
  }
}
"#;

pub const PIPELINE_INSTANCE: &str = r#"
query pipelineInstance($id: UUID!) {
  pipelineInstance(id: $id) {
    id
    status
    startTime
    endTime
  }
}
"#;
