use super::*;

mod deposit_run;

#[test]
fn test_collect_proceedings() -> TestResult<()> {
  let (_dir, project) = create_proceedings()?;
  let articles = collect_articles(&project)?;

  let titles: Vec<String> = articles.iter().map(Article::name).collect();
  assert_eq!(titles, ["Second Talk", "First Talk"]);

  let first = &articles[1];
  assert_eq!(first.frontmatter.license.as_deref(), Some("CC-BY-4.0"));
  assert_eq!(first.abstract_text.as_deref(), Some("All about First Talk."));
  assert_eq!(first.binding_file(), project.join("project.yml"));
  assert_eq!(first.download_files(), [project.join("files/b-first.pdf")]);
  Ok(())
}

#[test]
fn test_collect_empty_directory() -> TestResult<()> {
  let dir = tempdir()?;
  assert!(matches!(collect_articles(dir.path()), Err(DepositorError::NoArticles(_))));
  Ok(())
}
