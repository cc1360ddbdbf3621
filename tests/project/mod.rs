mod tests_config_stack;
mod tests_library_search;
