mod tests_host;
