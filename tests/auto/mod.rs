mod tests_autoinst;
mod tests_autologic;
mod tests_properties;
mod tests_templates;
