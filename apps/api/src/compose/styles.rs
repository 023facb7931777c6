/// Inline stylesheet for the resume document. Kept free of `url(...)` and
/// web fonts so the page has nothing to fetch before it can be printed.
pub const RESUME_CSS: &str = r#"
body {
  font-family: Arial, Helvetica, sans-serif;
  line-height: 1.6;
  color: #333;
  max-width: 800px;
  margin: 0 auto;
  padding: 20px;
}
.header {
  text-align: center;
  border-bottom: 2px solid #2563eb;
  padding-bottom: 20px;
  margin-bottom: 30px;
}
.name {
  font-size: 32px;
  font-weight: bold;
  color: #2563eb;
  margin-bottom: 10px;
}
.contact { font-size: 14px; color: #666; }
.section { margin-bottom: 30px; }
.section-title {
  font-size: 20px;
  font-weight: bold;
  color: #2563eb;
  border-bottom: 1px solid #e5e7eb;
  padding-bottom: 5px;
  margin-bottom: 15px;
}
.skills { display: flex; flex-wrap: wrap; gap: 10px; }
.skill-tag {
  background: #eff6ff;
  color: #2563eb;
  padding: 5px 12px;
  border-radius: 20px;
  font-size: 12px;
  font-weight: 500;
}
.experience-item { margin-bottom: 20px; }
.job-title { font-size: 16px; font-weight: bold; color: #1f2937; }
.company { font-size: 14px; color: #6b7280; margin-bottom: 5px; }
.preferences {
  background: #f9fafb;
  padding: 15px;
  border-radius: 8px;
  border-left: 4px solid #2563eb;
}
"#;
