//! Static file templates, parameterized only by app name and theme
//! colors. Generated units receive this content as their scaffold stub
//! and as the fallback when synthesis fails twice.

use crate::themes::Theme;

use super::{FileKind, PlannedFile};

/// Render the template content for one planned file.
pub fn render(file: &PlannedFile, app_name: &str, theme: &Theme) -> String {
    match file.kind {
        FileKind::Manifest => pubspec(app_name),
        FileKind::EntryPoint => main_dart(app_name, theme),
        FileKind::IgnoreRules => gitignore().to_string(),
        FileKind::LintConfig => analysis_options().to_string(),
        FileKind::Readme => readme(app_name),
        FileKind::ThemeColors => colors_dart(theme),
        FileKind::Strings => strings_dart(app_name),
        FileKind::Themes => themes_dart(theme),
        FileKind::Screen | FileKind::Model => dart_class_stub(&file.path),
    }
}

fn hex(color: &str) -> &str {
    color.trim_start_matches('#')
}

/// `my_task_app` -> `My Task App`
pub fn title_case(app_name: &str) -> String {
    app_name
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `lib/screens/task_list_screen.dart` -> `TaskListScreen`
pub fn class_name_for(path: &str) -> String {
    let stem = path
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .trim_end_matches(".dart");
    stem.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn pubspec(app_name: &str) -> String {
    format!(
        "name: {app_name}\n\
         description: A Flutter application built with OneDay.\n\
         publish_to: 'none'\n\
         version: 1.0.0+1\n\n\
         environment:\n\
         \x20 sdk: '>=3.0.0 <4.0.0'\n\n\
         dependencies:\n\
         \x20 flutter:\n\
         \x20   sdk: flutter\n\
         \x20 cupertino_icons: ^1.0.2\n\
         \x20 http: ^1.1.0\n\
         \x20 provider: ^6.1.0\n\n\
         dev_dependencies:\n\
         \x20 flutter_test:\n\
         \x20   sdk: flutter\n\
         \x20 flutter_lints: ^2.0.0\n\n\
         flutter:\n\
         \x20 uses-material-design: true\n"
    )
}

fn main_dart(app_name: &str, theme: &Theme) -> String {
    let title = title_case(app_name);
    format!(
        "import 'package:flutter/material.dart';\n\n\
         void main() {{\n\
         \x20 runApp(const MyApp());\n\
         }}\n\n\
         class MyApp extends StatelessWidget {{\n\
         \x20 const MyApp({{super.key}});\n\n\
         \x20 @override\n\
         \x20 Widget build(BuildContext context) {{\n\
         \x20   return MaterialApp(\n\
         \x20     title: '{title}',\n\
         \x20     theme: ThemeData(\n\
         \x20       colorScheme: ColorScheme.fromSeed(seedColor: const Color(0xFF{primary})),\n\
         \x20       useMaterial3: true,\n\
         \x20     ),\n\
         \x20     home: const Scaffold(\n\
         \x20       body: Center(child: Text('{title}')),\n\
         \x20     ),\n\
         \x20   );\n\
         \x20 }}\n\
         }}\n",
        title = title,
        primary = hex(&theme.colors.primary),
    )
}

fn gitignore() -> &'static str {
    "# Miscellaneous\n\
     *.class\n\
     *.log\n\
     *.swp\n\
     .DS_Store\n\
     .buildlog/\n\
     .history\n\n\
     # IntelliJ related\n\
     *.iml\n\
     *.ipr\n\
     *.iws\n\
     .idea/\n\n\
     # Flutter/Dart/Pub related\n\
     **/doc/api/\n\
     .dart_tool/\n\
     .flutter-plugins\n\
     .flutter-plugins-dependencies\n\
     .packages\n\
     .pub-cache/\n\
     .pub/\n\
     /build/\n\n\
     # Symbolication related\n\
     app.*.symbols\n\n\
     # Obfuscation related\n\
     app.*.map.json\n\n\
     # Coverage\n\
     coverage/\n"
}

fn analysis_options() -> &'static str {
    "include: package:flutter_lints/flutter.yaml\n\n\
     linter:\n\
     \x20 rules:\n\
     \x20   prefer_const_constructors: true\n\
     \x20   prefer_const_literals_to_create_immutables: true\n\
     \x20   prefer_final_fields: true\n\
     \x20   unnecessary_const: true\n\
     \x20   unnecessary_new: true\n"
}

fn readme(app_name: &str) -> String {
    format!(
        "# {title}\n\n\
         A Flutter application built with OneDay.\n\n\
         ## Getting Started\n\n\
         1. Install dependencies:\n\
         ```bash\n\
         flutter pub get\n\
         ```\n\n\
         2. Run the app:\n\
         ```bash\n\
         flutter run\n\
         ```\n\n\
         ## Project Structure\n\n\
         - `lib/`: Main application code\n\
         \x20 - `models/`: Data models\n\
         \x20 - `screens/`: Screen widgets\n\
         \x20 - `widgets/`: Reusable widgets\n\
         \x20 - `services/`: Business logic and API services\n\
         \x20 - `utils/`: Utility functions\n\
         \x20 - `constants/`: App constants\n\
         - `assets/`: Images, fonts, and other assets\n\
         - `test/`: Test files\n",
        title = title_case(app_name),
    )
}

fn colors_dart(theme: &Theme) -> String {
    format!(
        "import 'package:flutter/material.dart';\n\n\
         /// App color constants\n\
         class AppColors {{\n\
         \x20 static const Color primary = Color(0xFF{primary});\n\
         \x20 static const Color secondary = Color(0xFF{secondary});\n\
         \x20 static const Color accent = Color(0xFF{accent});\n\
         \x20 static const Color background = Color(0xFF{background});\n\
         \x20 static const Color text = Color(0xFF{text});\n\n\
         \x20 static const Color success = Color(0xFF27AE60);\n\
         \x20 static const Color error = Color(0xFFE74C3C);\n\
         \x20 static const Color warning = Color(0xFFF39C12);\n\
         \x20 static const Color info = Color(0xFF3498DB);\n\
         }}\n",
        primary = hex(&theme.colors.primary),
        secondary = hex(&theme.colors.secondary),
        accent = hex(&theme.colors.accent),
        background = hex(&theme.colors.background),
        text = hex(&theme.colors.text),
    )
}

fn strings_dart(app_name: &str) -> String {
    format!(
        "/// App string constants\n\
         class AppStrings {{\n\
         \x20 static const String appName = '{title}';\n\n\
         \x20 // Common strings\n\
         \x20 static const String ok = 'OK';\n\
         \x20 static const String cancel = 'Cancel';\n\
         \x20 static const String save = 'Save';\n\
         \x20 static const String delete = 'Delete';\n\
         \x20 static const String edit = 'Edit';\n\
         \x20 static const String loading = 'Loading...';\n\
         \x20 static const String error = 'An error occurred';\n\
         \x20 static const String retry = 'Retry';\n\
         }}\n",
        title = title_case(app_name),
    )
}

fn themes_dart(theme: &Theme) -> String {
    format!(
        "import 'package:flutter/material.dart';\n\
         import 'colors.dart';\n\n\
         /// App theme configuration ({name})\n\
         class AppTheme {{\n\
         \x20 static ThemeData get lightTheme {{\n\
         \x20   return ThemeData(\n\
         \x20     primaryColor: AppColors.primary,\n\
         \x20     colorScheme: ColorScheme.light(\n\
         \x20       primary: AppColors.primary,\n\
         \x20       secondary: AppColors.secondary,\n\
         \x20     ),\n\
         \x20     scaffoldBackgroundColor: AppColors.background,\n\
         \x20     appBarTheme: const AppBarTheme(\n\
         \x20       backgroundColor: AppColors.primary,\n\
         \x20       foregroundColor: Colors.white,\n\
         \x20       elevation: 0,\n\
         \x20     ),\n\
         \x20     useMaterial3: true,\n\
         \x20   );\n\
         \x20 }}\n\
         }}\n",
        name = theme.name,
    )
}

fn dart_class_stub(path: &str) -> String {
    let class_name = class_name_for(path);
    format!(
        "/// {class_name} placeholder\n\
         class {class_name} {{\n\
         }}\n"
    )
}
